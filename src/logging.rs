use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Event formatter producing the `[LEVEL] message` lines the CLI contract
/// promises on stdout.
struct PrefixFormat;

impl<S, N> FormatEvent<S, N> for PrefixFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();
        let prefix = if level == Level::ERROR {
            "[ERROR]"
        } else if level == Level::WARN {
            "[WARNING]"
        } else if level == Level::INFO {
            "[INFO]"
        } else if level == Level::DEBUG {
            "[DEBUG]"
        } else {
            "[TRACE]"
        };
        write!(writer, "{prefix} ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize the global subscriber. The default level comes from the
/// verbosity flags; `GITECHO_LOG` overrides it.
pub fn setup_logger(default_level: LevelFilter) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("GITECHO_LOG")
        .from_env_lossy();

    let fmt = fmt::layer()
        .event_format(PrefixFormat)
        .with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(fmt)
        .with(env_filter)
        .init();
}
