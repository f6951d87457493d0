use clap::Parser;
use inkpress::{config, output, pipeline};
use log::info;

fn version_string() -> &'static str {
    let hash = env!("INKPRESS_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(about = "Build the blog in the current directory")]
#[command(long_about = "\
Build the blog in the current directory

Reads src/, renders it with templates/, and writes the site to build/.

Project structure:

  site.toml                        # Optional overrides of the stock settings
  src/
  ├── index.md                     # Home page (front matter: template: post-list.hbt)
  ├── content/
  │   ├── posts/*.md               # Posts collection → posts/<name>/
  │   └── projects/*.md            # Projects collection → projects/<name>/
  └── css/
      ├── main.scss                # Compiled to css/main.css
      └── _vars.scss               # Partial, imported only
  templates/
  ├── post.hbt                     # Posts and projects
  ├── post-list.hbt                # Home and tag pages
  └── partials/header.hbt          # {% include \"header\" %}

Front matter (YAML between --- lines) becomes page metadata:
  title, date, tags (\"a, b\" or [a, b]), template, collection, excerpt,
  permalink: false

Set RUST_LOG=debug to trace each stage.")]
#[command(version = version_string())]
struct Cli {
    /// Deployment environment: `prod` links to the live site, anything else
    /// builds for local development
    env: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let environment = config::resolve_environment(cli.env.as_deref());
    let root = std::env::current_dir()?;
    let site_config = config::load_config(&root)?;
    info!(
        "building {} with base url '{}'",
        root.display(),
        environment.base_url
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_build_event(&event);
        }
    });
    let result = pipeline::site_pipeline(&root, &site_config, environment).build(Some(tx));
    printer.join().map_err(|_| "output thread panicked")?;

    // A failed build is reported but does not change the exit status.
    match result {
        Ok(report) => output::print_build_report(&report),
        Err(err) => output::print_build_error(&err),
    }

    Ok(())
}
