use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use std::io;
use std::path::{Path, PathBuf};
use taxon::aggregate::aggregate;
use taxon::config::Config;
use taxon::parser::Parser;
use taxon::post::PostRecord;
use taxon::render::{write_aggregate, write_template, Format};
use taxon::scaffold::{self, Mode, NewPost, Prompter};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let matches = app().get_matches();
    init_logging(matches.occurrences_of("verbose"));
    if let Err(e) = run(&matches) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("taxon")
        .version(crate_version!())
        .about("Summarizes blog tags and categories and scaffolds new posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Logs more detail (repeat for more)"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .value_name("FILE")
                .help("Uses this project file instead of searching for taxon.yaml"),
        )
        .arg(
            Arg::with_name("content-dir")
                .long("content-dir")
                .takes_value(true)
                .value_name("DIR")
                .help("Overrides the content directory"),
        )
        .subcommand(
            SubCommand::with_name("taxonomy")
                .about("Prints tag counts and category summaries")
                .arg(
                    Arg::with_name("format")
                        .long("format")
                        .takes_value(true)
                        .possible_values(&["text", "yaml"])
                        .default_value("text"),
                )
                .arg(
                    Arg::with_name("template")
                        .long("template")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .value_name("FILE")
                        .help("Renders through these template files instead of --format"),
                ),
        )
        .subcommand(
            SubCommand::with_name("new")
                .about("Creates a new post, prompting for anything not given")
                .arg(
                    Arg::with_name("collection")
                        .long("collection")
                        .takes_value(true)
                        .value_name("NAME"),
                )
                .arg(
                    Arg::with_name("date")
                        .long("date")
                        .takes_value(true)
                        .value_name("YYYY/MM/DD")
                        .help("Back-fills a post on this date"),
                )
                .arg(
                    Arg::with_name("title")
                        .long("title")
                        .takes_value(true)
                        .value_name("TITLE"),
                ),
        )
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    debug!(content_directory = %config.content_directory.display(), "resolved configuration");
    match matches.subcommand() {
        ("taxonomy", Some(sub)) => taxonomy(&config, sub),
        ("new", Some(sub)) => new_post(&config, sub),
        (name, _) => Err(anyhow!("unknown subcommand `{}`", name)),
    }
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.value_of("config") {
        Some(path) => Config::from_project_file(Path::new(path))?,
        None => Config::from_directory(
            &std::env::current_dir().context("Getting the current directory")?,
        )?,
    };
    if let Some(dir) = matches.value_of("content-dir") {
        config.content_directory = PathBuf::from(dir);
    }
    Ok(config)
}

fn taxonomy(config: &Config, matches: &ArgMatches) -> Result<()> {
    let posts = Parser::new(&config.content_directory)
        .parse_posts()
        .context("Loading posts")?;
    let records: Vec<PostRecord> = posts.into_iter().map(|p| p.record).collect();
    let aggregate = aggregate(&records);

    let stdout = io::stdout();
    let out = stdout.lock();
    match matches.values_of("template") {
        Some(templates) => write_template(&aggregate, templates, out)?,
        None => {
            let format: Format = matches
                .value_of("format")
                .unwrap_or("text")
                .parse()
                .map_err(anyhow::Error::msg)?;
            write_aggregate(&aggregate, format, out)?
        }
    }
    Ok(())
}

fn new_post(config: &Config, matches: &ArgMatches) -> Result<()> {
    let today = Local::now().naive_local().date();
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let collection = match matches.value_of("collection") {
        Some(collection) => collection.to_owned(),
        None => prompter.collection(&scaffold::collections(&config.content_directory)?)?,
    };
    let mode = match matches.value_of("date") {
        Some(date) => Mode::Dated(scaffold::parse_date(date, today)?),
        None if matches.is_present("collection") && matches.is_present("title") => Mode::Today,
        None => prompter.mode(today)?,
    };
    let title = match matches.value_of("title") {
        Some(title) => title.to_owned(),
        None => prompter.title()?,
    };

    let post = NewPost {
        collection,
        mode,
        title,
    };
    let plan = match scaffold::scaffold(config, &post) {
        Ok(plan) => plan,
        Err(e @ scaffold::Error::AlreadyExists(_)) if post.mode != Mode::Today => {
            return Err(anyhow::Error::new(e).context(
                "A post with this title already exists on that date; change the title or create it for today",
            ))
        }
        Err(e) => return Err(e.into()),
    };

    println!("Created {}", plan.path.display());
    println!("Preview at {}", plan.preview_url);
    Ok(())
}
