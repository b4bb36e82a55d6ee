//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Structured logging context and lifecycle events."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! Context-enriched logging macros.

#[doc(hidden)]
#[macro_export]
macro_rules! __vsim_event {
    ($lvl:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext = &$ctx;
        tracing::event!(
            $lvl,
            site = ctx.site.unwrap_or(""),
            asset = ctx.asset.unwrap_or(""),
            device = ctx.device.unwrap_or(""),
            pass = ctx.pass.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with simulation context.
#[macro_export]
macro_rules! vsim_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with simulation context.
#[macro_export]
macro_rules! vsim_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with simulation context.
#[macro_export]
macro_rules! vsim_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with simulation context.
#[macro_export]
macro_rules! vsim_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vsim_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
