//! Log and trace output of the binary.
//!
//! Logs go to stderr through `tracing-subscriber`, filtered by `RUST_LOG`
//! (`info` when unset), so stdout stays reserved for command output.
//!
//! With the `telemetry` feature, spans are also exported over OTLP once any of
//! `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_EXPORTER_OTLP_HEADERS` or
//! `OTEL_EXPORTER_OTLP_PROTOCOL` is set.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(feature = "telemetry")]
mod otlp {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
    use opentelemetry_semantic_conventions::SCHEMA_URL;
    use opentelemetry_semantic_conventions::attribute::{
        DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION,
    };
    use std::env;

    /// OTLP wire protocol.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Protocol {
        Http,
        Grpc,
    }

    impl Protocol {
        /// `None` unless OTLP export is configured.
        pub fn from_env() -> Option<Self> {
            let enabled = ["ENDPOINT", "HEADERS", "PROTOCOL"]
                .iter()
                .any(|suffix| env::var(format!("OTEL_EXPORTER_OTLP_{suffix}")).is_ok());
            if !enabled {
                return None;
            }
            match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
                Ok("grpc") => Some(Protocol::Grpc),
                _ => Some(Protocol::Http),
            }
        }
    }

    fn resource() -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(env!("CARGO_PKG_NAME"))
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    pub fn tracer_provider(
        protocol: Protocol,
    ) -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            Protocol::Http => exporter.with_http().build()?,
            Protocol::Grpc => exporter.with_tonic().build()?,
        };
        Ok(SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource())
            .with_batch_exporter(exporter)
            .build())
    }
}

/// Installed log subscriber. Flushes exported spans when dropped.
pub struct Telemetry {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Telemetry {
    /// Installs the global subscriber. Call once, early in `main`.
    pub fn init() -> Self {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let registry = tracing_subscriber::registry().with(filter).with(fmt);

        #[cfg(feature = "telemetry")]
        {
            use opentelemetry::trace::TracerProvider as _;

            let tracer_provider = otlp::Protocol::from_env().and_then(|protocol| {
                match otlp::tracer_provider(protocol) {
                    Ok(provider) => Some((protocol, provider)),
                    Err(e) => {
                        eprintln!("Failed to build OTLP span exporter: {e}");
                        None
                    }
                }
            });
            let layer = tracer_provider.as_ref().map(|(_, provider)| {
                tracing_opentelemetry::OpenTelemetryLayer::new(provider.tracer(env!("CARGO_PKG_NAME")))
            });
            registry.with(layer).init();
            match &tracer_provider {
                Some((protocol, _)) => {
                    tracing::info!(protocol = ?protocol, "OpenTelemetry span export is enabled")
                }
                None => tracing::debug!("OpenTelemetry span export is not enabled"),
            }
            Self {
                tracer_provider: tracer_provider.map(|(_, provider)| provider),
            }
        }

        #[cfg(not(feature = "telemetry"))]
        {
            registry.init();
            Self {}
        }
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(tracer_provider) = self.tracer_provider.as_ref() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
