/// Log target used for lines that report a finished step.
pub const SUCCESS_TARGET: &str = "proxyscout::success";

/// Emits an info-level event that terminal formatters render as a success line.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "proxyscout::success", $($arg)*)
    };
}
