use std::path::PathBuf;

use clap::Parser;
use session::{FileSessionStore, InMemorySessionStore, SessionStore};
use tracing::info;
use tracing_subscriber::EnvFilter;
use view::ViewerConfig;
use viewer::{MapWidget, Step, load_atlas};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay an interaction script against the Northeast India map")]
struct Args {
    /// State boundaries (GeoJSON FeatureCollection)
    #[arg(long)]
    states: PathBuf,

    /// District boundaries (GeoJSON FeatureCollection)
    #[arg(long)]
    districts: PathBuf,

    /// Viewer configuration (JSON); defaults apply when omitted
    #[arg(long, env = "VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Persist the view state to this JSON file between runs
    #[arg(long)]
    session: Option<PathBuf>,

    /// Print every emitted widget event
    #[arg(long)]
    trace_events: bool,

    /// Steps: state:NAME, district:NAME, hover:NAME, leave, back, reset, wait:MS, explore
    steps: Vec<Step>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path).map_err(|e| e.to_string())?,
        None => ViewerConfig::default(),
    };
    let atlas = load_atlas(&args.states, &args.districts, &config).map_err(|e| e.to_string())?;

    let session: Box<dyn SessionStore> = match args.session {
        Some(path) => Box::new(FileSessionStore::new(path)),
        None => Box::new(InMemorySessionStore::new()),
    };

    let mut widget = MapWidget::mount(atlas, session, config).map_err(|e| e.to_string())?;
    info!(label = %widget.state().label, "widget mounted");
    print_status("mount", &widget);

    let mut routes: Vec<String> = Vec::new();
    for step in &args.steps {
        widget.run_step(step, &mut routes);
        // Let the deferred commit land so every printed line shows a settled level.
        widget.advance_frame();
        print_status(&format!("{step:?}"), &widget);
    }

    for route in &routes {
        println!("navigate {route}");
    }
    if args.trace_events {
        for event in widget.events().events() {
            println!(
                "[{:>5} {:>6}ms] {:<10} {}",
                event.frame_index,
                event.time.ms(),
                event.kind,
                event.message
            );
        }
    }
    Ok(())
}

fn print_status(step: &str, widget: &MapWidget) {
    let frame = widget.render();
    println!(
        "{step:<40} level={:<8} label={:<24} districts={} transform={}",
        frame.level.to_string(),
        frame.label,
        frame.districts.len(),
        frame.transform_attr
    );
}
