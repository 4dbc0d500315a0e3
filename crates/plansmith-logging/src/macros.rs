//! ---
//! plansmith_section: "03-logging"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Structured logging context and lifecycle events."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
#[doc(hidden)]
#[macro_export]
macro_rules! __authoring_event {
    ($level:expr, context = $ctx:expr, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext = &$ctx;
        $crate::tracing::event!(
            $level,
            service = $crate::LogContext::field(&ctx.service),
            workspace = $crate::LogContext::field(&ctx.workspace),
            artifact = $crate::LogContext::field(&ctx.artifact),
            operation = $crate::LogContext::field(&ctx.operation),
            message = %format_args!($($arg)+)
        );
    }};
    ($level:expr, $($arg:tt)+) => {{
        $crate::__authoring_event!($level, context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit an informational log enriched with the authoring context.
#[macro_export]
macro_rules! authoring_info {
    ($($arg:tt)+) => {
        $crate::__authoring_event!($crate::tracing::Level::INFO, $($arg)+)
    };
}

/// Emit a debug log enriched with the authoring context.
#[macro_export]
macro_rules! authoring_debug {
    ($($arg:tt)+) => {
        $crate::__authoring_event!($crate::tracing::Level::DEBUG, $($arg)+)
    };
}

/// Emit a warning enriched with the authoring context.
#[macro_export]
macro_rules! authoring_warn {
    ($($arg:tt)+) => {
        $crate::__authoring_event!($crate::tracing::Level::WARN, $($arg)+)
    };
}

/// Emit an error log enriched with the authoring context.
#[macro_export]
macro_rules! authoring_error {
    ($($arg:tt)+) => {
        $crate::__authoring_event!($crate::tracing::Level::ERROR, $($arg)+)
    };
}
