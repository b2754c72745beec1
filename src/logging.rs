use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tessera_config::ServerConfig;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn init_tracer(config: &ServerConfig) -> Result<Tracer, TraceError> {
    info!(
        "Initializing OpenTelemetry tracer with endpoint: {}",
        config.otlp_endpoint
    );

    // Set up trace context propagator for distributed tracing
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("environment", config.environment.as_str()),
    ]);

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone());

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)?;

    Ok(tracer)
}

fn console_layer(config: &ServerConfig) -> BoxedLayer {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,tessera_db=info,tessera_auth=info,tower_http=warn,hyper=info,tonic=info",
            env!("CARGO_CRATE_NAME")
        ))
    });

    if config.environment.is_development() {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .compact()
            .with_filter(console_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_filter(console_filter)
            .boxed()
    }
}

fn file_layers(config: &ServerConfig) -> anyhow::Result<Vec<BoxedLayer>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    std::fs::create_dir_all(&config.log_dir)?;

    // Errors only, plain text
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "tessera.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"))
        .boxed();

    // JSON file layer for structured logs (can be ingested by Loki)
    let json_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "tessera.json");
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"))
        .boxed();

    Ok(vec![file_layer, json_layer])
}

/// Installs the global subscriber.
///
/// With observability disabled only the console layer is installed. Otherwise
/// daily rolling files are added, plus an OTLP exporter when one can be built.
pub fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    let mut layers = vec![console_layer(config)];

    if !config.observability_enabled {
        tracing_subscriber::registry().with(layers).try_init()?;
        info!("Tracing initialized (console only, observability disabled)");
        return Ok(());
    }

    layers.extend(file_layers(config)?);

    match init_tracer(config) {
        Ok(tracer) => {
            layers.push(
                tracing_opentelemetry::layer()
                    .with_tracer(tracer)
                    .boxed(),
            );
            tracing_subscriber::registry().with(layers).try_init()?;
            info!("Tracing initialized with OpenTelemetry and file logging");
        }
        Err(e) => {
            // If OpenTelemetry fails to initialize, continue without it
            tracing_subscriber::registry().with(layers).try_init()?;
            warn!(
                error = %e,
                "Failed to initialize OpenTelemetry, tracing without export (file logging only)"
            );
        }
    }

    Ok(())
}

pub async fn shutdown_tracer() {
    info!("Shutting down OpenTelemetry tracer...");

    // Shutdown the global tracer provider
    global::shutdown_tracer_provider();

    info!("OpenTelemetry tracer shutdown complete");
}
