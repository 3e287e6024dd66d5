use flexi_logger::{
    filter::{self, LogLineFilter},
    Age, Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode,
};

/// Drops the chatty records of the HTTP stack
pub struct IgnoreReqwest;

impl IgnoreReqwest {
    fn is_ignored(path: &str) -> bool {
        ["reqwest", "hyper", "h2", "rustls"]
            .iter()
            .any(|p| path.starts_with(p))
    }
}

impl LogLineFilter for IgnoreReqwest {
    fn write(
        &self,
        now: &mut flexi_logger::DeferredNow,
        record: &log::Record,
        log_line_writer: &dyn filter::LogLineWriter,
    ) -> std::io::Result<()> {
        let path = record.module_path().unwrap_or_default();

        if IgnoreReqwest::is_ignored(path) {
            return Ok(());
        }

        log_line_writer.write(now, record)
    }
}

/// Starts the logger, the returned handle must be kept alive until exit
pub fn start(
    level: &str,
    data_directory: &str,
    retention: usize,
) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(level)?
        .log_to_file(
            FileSpec::default()
                .directory(format!("{data_directory}/logs"))
                .basename("freebox-session-gateway"),
        )
        .duplicate_to_stderr(Duplicate::All)
        .format_for_stderr(flexi_logger::colored_default_format)
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(retention),
        )
        .write_mode(WriteMode::Async)
        .filter(Box::new(IgnoreReqwest))
        .start()
}

#[cfg(test)]
mod tests {
    use super::IgnoreReqwest;

    #[test]
    fn http_stack_is_ignored() {
        assert!(IgnoreReqwest::is_ignored("reqwest::connect"));
        assert!(IgnoreReqwest::is_ignored("hyper_util::client"));
        assert!(!IgnoreReqwest::is_ignored("wiremock::mock_server"));
        assert!(!IgnoreReqwest::is_ignored(
            "freebox_session_gateway::core::gateway"
        ));
    }
}
