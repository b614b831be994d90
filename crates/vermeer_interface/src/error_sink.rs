/// Destination for errors that exhausted their retries.
///
/// The worker pool reports every dead-lettered job here so operators hear
/// about permanently failed work without scraping logs. Deployments that
/// forward to an external tracker implement this trait; everything else
/// uses [`TracingErrorSink`].
pub trait ErrorSink: Send + Sync {
    /// Records a terminal failure from the named source.
    fn capture(&self, source: &str, message: &str);
}

/// An [`ErrorSink`] that emits failures as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn capture(&self, source: &str, message: &str) {
        tracing::error!(source, message, "captured terminal failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_sink_is_object_safe() {
        let sink: Box<dyn ErrorSink> = Box::new(TracingErrorSink);
        sink.capture("queue:generate_image", "provider rejected the prompt");
    }
}
