//! Scaffolds new posts. A new post lives in a content collection (a
//! first-level directory of the content directory) under a `YYYY/MM/DD`
//! date path, and starts out as a frontmatter block plus a placeholder body.
//!
//! There are two ways to pick the date, see [`Mode`]. Scaffolding never
//! overwrites an existing file.
//!
//! [`Prompter`] gathers the inputs interactively; [`plan`] and [`create`]
//! do the work and can be used without it.

use crate::config::Config;
use crate::slug::title_slug;
use chrono::{DateTime, Local, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How the date of a new post is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Today's date. The file name gets a `_{unix millis}` suffix so that
    /// several posts with the same title can be created on one day.
    Today,

    /// A specific date that isn't in the future, for back-filling posts. The
    /// file name has no suffix.
    Dated(NaiveDate),
}

/// The inputs for a new post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    pub collection: String,
    pub mode: Mode,
    pub title: String,
}

/// A post file ready to be written by [`create`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub path: PathBuf,
    pub contents: String,

    /// The site path where the post can be previewed.
    pub preview_url: String,
}

/// Lists the content collections (first-level subdirectories) of
/// `content_directory`, sorted by name.
pub fn collections(content_directory: &Path) -> Result<Vec<String>> {
    if !content_directory.is_dir() {
        return Err(Error::ContentDirectoryMissing(
            content_directory.to_owned(),
        ));
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(content_directory)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Parses a `YYYY/MM/DD` date. The date must exist on the calendar and must
/// not come after `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim();
    let well_formed = input.len() == 10
        && input.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '/',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(Error::InvalidDateFormat(input.to_owned()));
    }

    // the checks above guarantee ASCII digits at these offsets
    let field = |range: std::ops::Range<usize>| input[range].parse::<u32>().unwrap_or(0);
    let date = NaiveDate::from_ymd_opt(field(0..4) as i32, field(5..7), field(8..10))
        .ok_or_else(|| Error::InvalidDate(input.to_owned()))?;
    if date > today {
        return Err(Error::FutureDate(date));
    }
    Ok(date)
}

/// Validates a post title and returns it trimmed. Titles may only contain
/// ASCII letters and digits, CJK ideographs, whitespace, and hyphens.
pub fn validate_title(input: &str) -> Result<String> {
    let allowed = |c: char| {
        c.is_ascii_alphanumeric()
            || ('\u{4e00}'..='\u{9fa5}').contains(&c)
            || c.is_whitespace()
            || c == '-'
    };
    if !input.chars().all(allowed) {
        return Err(Error::InvalidTitle(input.to_owned()));
    }
    match input.trim() {
        "" => Err(Error::EmptyTitle),
        title => Ok(title.to_owned()),
    }
}

#[derive(Serialize)]
struct Frontmatter<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(rename = "pubDate")]
    pub_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    tags: &'a [String],
}

/// Computes the target path and contents of `post` without touching the file
/// system. `now` is the current local time.
pub fn plan(config: &Config, post: &NewPost, now: DateTime<Local>) -> Result<Plan> {
    let title = validate_title(&post.title)?;
    let (date, published, suffix) = match post.mode {
        Mode::Today => (
            now.naive_local().date(),
            now.with_timezone(&Utc),
            format!("_{}", now.timestamp_millis()),
        ),
        Mode::Dated(date) => (
            date,
            local_midnight(date).ok_or_else(|| Error::InvalidDate(date.to_string()))?,
            String::new(),
        ),
    };

    let slug = title_slug(&title);
    let date_path = date.format("%Y/%m/%d").to_string();
    let path = config
        .content_directory
        .join(&post.collection)
        .join(date.format("%Y").to_string())
        .join(date.format("%m").to_string())
        .join(date.format("%d").to_string())
        .join(format!("{}{}.md", slug, suffix));
    let preview_url = format!("/{}/{}/{}", post.collection, date_path, slug);

    let mut frontmatter = serde_yaml::to_string(&Frontmatter {
        title: &title,
        description: &config.description,
        pub_date: published.to_rfc3339_opts(SecondsFormat::Millis, true),
        author: config.author.as_deref(),
        tags: &config.default_tags,
    })?;
    if !frontmatter.ends_with('\n') {
        frontmatter.push('\n');
    }
    let frontmatter = frontmatter.strip_prefix("---\n").unwrap_or(&frontmatter);

    let contents = format!(
        "---\n{}---\n\n# {}\n\nStart writing here.\n\nPreview this post at:\n{}\n",
        frontmatter, title, preview_url,
    );
    Ok(Plan {
        path,
        contents,
        preview_url,
    })
}

// Midnight local time on `date`, in UTC. Falls back to midnight UTC when
// local midnight doesn't exist (DST transitions).
fn local_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    })
}

/// Writes a planned post to disk, creating its parent directories. Fails
/// with [`Error::AlreadyExists`] rather than overwriting a file.
pub fn create(plan: &Plan) -> Result<()> {
    if let Some(dir) = plan.path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&plan.path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(plan.path.clone()))
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(plan.contents.as_bytes())?;
    info!(path = %plan.path.display(), preview = %plan.preview_url, "created post");
    Ok(())
}

/// Asks for the inputs of a new post on `output`, reading answers from
/// `input`. Invalid answers are reported and the question is asked again;
/// running out of input is an error.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::EndOfInput);
        }
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_owned())
    }

    fn complain(&mut self, message: &dyn fmt::Display) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    /// Lists `collections` and asks for one by number.
    pub fn collection(&mut self, collections: &[String]) -> Result<String> {
        if collections.is_empty() {
            return Err(Error::NoCollections);
        }
        writeln!(self.output, "Collections:")?;
        for (i, name) in collections.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, name)?;
        }
        loop {
            let answer = self.ask(&format!(
                "Choose a collection (1-{}): ",
                collections.len()
            ))?;
            match answer.trim().parse::<usize>() {
                Ok(n) if n >= 1 && n <= collections.len() => {
                    return Ok(collections[n - 1].clone())
                }
                _ => self.complain(&"Invalid choice, enter one of the listed numbers.")?,
            }
        }
    }

    /// Asks for the creation mode, and for the date in [`Mode::Dated`].
    pub fn mode(&mut self, today: NaiveDate) -> Result<Mode> {
        writeln!(self.output, "Modes:")?;
        writeln!(self.output, "  [1] Today (file name gets a timestamp suffix)")?;
        writeln!(self.output, "  [2] A specific date (no suffix)")?;
        loop {
            match self.ask("Choose a mode (1/2): ")?.trim() {
                "1" => return Ok(Mode::Today),
                "2" => return Ok(Mode::Dated(self.date(today)?)),
                _ => self.complain(&"Invalid choice, enter 1 or 2.")?,
            }
        }
    }

    /// Asks for a `YYYY/MM/DD` date no later than `today`.
    pub fn date(&mut self, today: NaiveDate) -> Result<NaiveDate> {
        loop {
            let answer = self.ask("Date (YYYY/MM/DD): ")?;
            match parse_date(&answer, today) {
                Ok(date) => return Ok(date),
                Err(e) => self.complain(&e)?,
            }
        }
    }

    /// Asks for a post title.
    pub fn title(&mut self) -> Result<String> {
        loop {
            let answer = self.ask("Title (letters, digits, spaces, hyphens): ")?;
            match validate_title(&answer) {
                Ok(title) => return Ok(title),
                Err(e) => self.complain(&e)?,
            }
        }
    }
}

/// Plans and creates `post` under `config`, returning what was written.
pub fn scaffold(config: &Config, post: &NewPost) -> Result<Plan> {
    if !collections(&config.content_directory)?.contains(&post.collection) {
        return Err(Error::UnknownCollection(post.collection.clone()));
    }
    let plan = plan(config, post, Local::now())?;
    debug!(path = %plan.path.display(), "planned post");
    create(&plan)?;
    Ok(plan)
}

/// The result of a scaffolding operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem scaffolding a post.
#[derive(Debug)]
pub enum Error {
    /// Returned when the content directory doesn't exist.
    ContentDirectoryMissing(PathBuf),

    /// Returned when the content directory has no collections to choose
    /// from.
    NoCollections,

    /// Returned when the requested collection doesn't exist.
    UnknownCollection(String),

    /// Returned when a date isn't written as `YYYY/MM/DD`.
    InvalidDateFormat(String),

    /// Returned when a well-formed date doesn't exist (e.g., `2023/02/30`).
    InvalidDate(String),

    /// Returned when a date is after today.
    FutureDate(NaiveDate),

    /// Returned when a title contains disallowed characters.
    InvalidTitle(String),

    /// Returned when a title is blank.
    EmptyTitle,

    /// Returned when the target file already exists.
    AlreadyExists(PathBuf),

    /// Returned when input ends before a question is answered.
    EndOfInput,

    /// Returned when the frontmatter can't be serialized.
    Yaml(serde_yaml::Error),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ContentDirectoryMissing(path) => {
                write!(f, "Content directory `{}` doesn't exist", path.display())
            }
            Error::NoCollections => write!(f, "No content collections found"),
            Error::UnknownCollection(name) => {
                write!(f, "Unknown collection `{}`", name)
            }
            Error::InvalidDateFormat(input) => {
                write!(f, "Invalid date `{}`, use YYYY/MM/DD", input)
            }
            Error::InvalidDate(input) => write!(f, "No such date `{}`", input),
            Error::FutureDate(date) => write!(
                f,
                "Can't create a post in the future ({})",
                date.format("%Y/%m/%d")
            ),
            Error::InvalidTitle(title) => write!(
                f,
                "Title `{}` contains punctuation or symbols",
                title
            ),
            Error::EmptyTitle => write!(f, "Title can't be empty"),
            Error::AlreadyExists(path) => {
                write!(f, "File `{}` already exists", path.display())
            }
            Error::EndOfInput => write!(f, "Unexpected end of input"),
            Error::Yaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Yaml(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    /// Converts a [`io::Error`] into an [`Error`]. It allows us to use the `?`
    /// operator for fallible I/O functions.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`].
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}
