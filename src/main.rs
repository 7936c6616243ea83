use anyhow::Result;
use argh::FromArgs;
use minipage::markdown::CmarkRenderer;
use minipage::{Config, Context, Page, Source, Title};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(FromArgs)]
/// Render Markdown files into a single HTML page. Use `-` for standard input.
struct Args {
    /// markdown file to include above the body
    #[argh(option)]
    header: Option<String>,

    /// markdown file to include below the body
    #[argh(option)]
    footer: Option<String>,

    /// markdown file to include in the sidebar
    #[argh(option)]
    sidebar: Option<String>,

    /// stylesheet URL to link instead of the built-in styles
    #[argh(option)]
    css: Option<String>,

    /// page title
    #[argh(option)]
    title: Option<String>,

    /// read the page title from the first line of this file
    #[argh(option)]
    title_file: Option<String>,

    /// text of the link placed beside each heading (default "."; empty for none)
    #[argh(option)]
    anchor_text: Option<String>,

    /// rewrite README to index in relative link targets
    #[argh(switch)]
    readme_to_index: bool,

    /// put an outline of the headings in the sidebar
    #[argh(switch)]
    outline: bool,

    /// configuration file (default: minipage.toml, if present)
    #[argh(option)]
    config: Option<PathBuf>,

    /// log what is going on
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// markdown files making up the page body, in order
    #[argh(positional)]
    bodies: Vec<String>,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::load(Path::new("."))?,
        };
        if self.css.is_some() {
            config.css.clone_from(&self.css);
        }
        if self.anchor_text.is_some() {
            config.anchor_text.clone_from(&self.anchor_text);
        }
        config.readme_to_index |= self.readme_to_index;
        config.outline |= self.outline;
        Ok(config)
    }

    fn page(&self, config: &Config) -> Page {
        let source = |arg: &Option<String>| arg.as_deref().map(Source::from_arg);
        let title = match (&self.title_file, &self.title) {
            (Some(file), _) => Some(Title::File(Source::from_arg(file))),
            (None, Some(text)) => Some(Title::Text(text.clone())),
            (None, None) => None,
        };
        Page {
            header: source(&self.header),
            bodies: self.bodies.iter().map(|b| Source::from_arg(b)).collect(),
            footer: source(&self.footer),
            sidebar: source(&self.sidebar),
            css_url: config.css.clone(),
            title,
            outline: config.outline,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not set up logging: {e}");
    }
}

fn print_usage() {
    let name = env!("CARGO_PKG_NAME");
    eprintln!("{name} {}\n", env!("CARGO_PKG_VERSION"));
    if let Err(help) = Args::from_args(&[name], &["--help"]) {
        eprintln!("{}", help.output);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.load_config()?;
    let page = args.page(&config);
    let ctx = Context::<CmarkRenderer>::from_config(&config);

    let mut out = BufWriter::new(io::stdout().lock());
    ctx.render_page(&page, &mut out)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    init_logging(args.verbose);

    if args.bodies.is_empty() {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
