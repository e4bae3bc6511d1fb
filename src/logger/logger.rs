use anyhow::{Result, anyhow};
use serde::Deserialize;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
}

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type FormatLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Installs the global subscriber once; both the filter and the output
/// format can be swapped after settings are loaded.
pub struct Logger {
    filter_handle: reload::Handle<EnvFilter, Registry>,
    format_handle: reload::Handle<FormatLayer, FilteredRegistry>,
}

impl Logger {
    pub fn new_bootstrap() -> Self {
        let filter = EnvFilter::new("info");
        let (filter, filter_handle) = reload::Layer::new(filter);
        let (format, format_handle) = reload::Layer::new(Self::format_layer(LogFormat::Pretty));

        tracing_subscriber::registry()
            .with(filter)
            .with(format)
            .init();

        Self {
            filter_handle,
            format_handle,
        }
    }

    fn format_layer(format: LogFormat) -> FormatLayer {
        match format {
            LogFormat::Pretty => Box::new(fmt::layer::<FilteredRegistry>()),
            LogFormat::Json => Box::new(
                fmt::layer::<FilteredRegistry>()
                    .json()
                    .with_current_span(true)
                    .flatten_event(true),
            ),
        }
    }

    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        let filter = EnvFilter::try_new(&config.filter).map_err(|e| anyhow!(e))?;
        self.filter_handle.reload(filter).map_err(|e| anyhow!(e))?;
        self.format_handle
            .reload(Self::format_layer(config.format))
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
