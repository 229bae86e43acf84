//! Defines the [`Post`], [`Parser`], and [`Error`] types. Also defines the
//! logic for loading posts' frontmatter from the file system into memory so
//! their [`PostRecord`]s can be aggregated (see [`crate::aggregate`]).

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::post::{deserialize_scalar, PostRecord};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

/// A post loaded from a content directory.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The path of the source file.
    pub path: PathBuf,

    /// The post's title, if its frontmatter has one.
    pub title: Option<String>,

    /// The post's publication date as written in the frontmatter.
    pub pub_date: Option<String>,

    /// The post's taxonomy metadata.
    pub record: PostRecord,
}

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `content_directory` is searched recursively for post files.
    content_directory: &'a Path,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser rooted at `content_directory`.
    pub fn new(content_directory: &'a Path) -> Parser<'a> {
        Parser { content_directory }
    }

    /// Searches the content directory for post files (extension `.md` or
    /// `.mdx`) and returns a list of [`Post`] objects ordered by path. Each
    /// post file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with optional fields `title`, `pubDate`, `tags`,
    ///    `category`, and `categories`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// pubDate: 2021-04-16
    /// tags: [greet]
    /// category: Notes
    /// ---
    /// # Hello
    /// ```
    pub fn parse_posts(&self) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        let walker = WalkDir::new(self.content_directory)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let entry = result?;
            if entry.file_type().is_file() && Self::is_markdown(entry.path()) {
                posts.push(self.parse_post(entry.path())?);
            }
        }
        debug!(
            directory = %self.content_directory.display(),
            posts = posts.len(),
            "loaded posts"
        );
        Ok(posts)
    }

    /// Parses a single [`Post`] from the file at `path`.
    pub fn parse_post(&self, path: &Path) -> Result<Post> {
        match Self::_parse_post(path) {
            Ok(p) => {
                debug!(path = %path.display(), "parsed post");
                Ok(p)
            }
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(path: &Path) -> Result<Post> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;

        let (yaml_start, yaml_stop) = frontmatter_indices(&contents)?;
        let frontmatter: Frontmatter =
            match contents[yaml_start..yaml_stop].trim().is_empty() {
                // an empty document deserializes as null, not a mapping
                true => Frontmatter::default(),
                false => serde_yaml::from_str(&contents[yaml_start..yaml_stop])?,
            };

        Ok(Post {
            path: path.to_owned(),
            title: frontmatter.title,
            pub_date: frontmatter.pub_date,
            record: frontmatter.record,
        })
    }

    fn is_markdown(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| MARKDOWN_EXTENSIONS.contains(&ext))
            .unwrap_or(false)
    }
}

/// Returns the start and stop offsets of the YAML between the frontmatter
/// fences. The terminal fence must be a line of exactly `---`.
fn frontmatter_indices(input: &str) -> Result<(usize, usize)> {
    const FENCE: &str = "---";
    const END_FENCE: &str = "\n---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    let yaml_start = FENCE.len();
    for (offset, _) in input[yaml_start..].match_indices(END_FENCE) {
        let rest = &input[yaml_start + offset + END_FENCE.len()..];
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
            return Ok((yaml_start, yaml_start + offset + 1));
        }
    }
    Err(Error::FrontmatterMissingEndFence)
}

#[derive(Deserialize, Default)]
struct Frontmatter {
    #[serde(default, deserialize_with = "deserialize_scalar")]
    title: Option<String>,

    #[serde(default, rename = "pubDate", deserialize_with = "deserialize_scalar")]
    pub_date: Option<String>,

    #[serde(flatten)]
    record: PostRecord,
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the content directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::post::CategoryField;

    #[test]
    fn test_parse_posts() -> Result<()> {
        let dir = Path::new("./testdata/content/");
        let posts = Parser::new(dir).parse_posts()?;

        let paths: Vec<PathBuf> = posts
            .iter()
            .map(|p| p.path.strip_prefix(dir).unwrap().to_owned())
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("blog/2024/01/05/hello-world.md"),
                PathBuf::from("blog/2024/02/11/astro-tips.mdx"),
                PathBuf::from("notes/malformed.md"),
                PathBuf::from("notes/untagged.md"),
            ]
        );

        assert_eq!(posts[0].title.as_deref(), Some("Hello World"));
        assert_eq!(posts[0].pub_date.as_deref(), Some("2024-01-05"));
        assert_eq!(
            posts[0].record.category,
            Some(CategoryField::Name("Tech".to_owned()))
        );
        assert_eq!(posts[2].record.tags, None);
        assert_eq!(posts[3].record, PostRecord::default());
        Ok(())
    }

    #[test]
    fn test_aggregate_testdata() -> Result<()> {
        let posts = Parser::new(Path::new("./testdata/content/")).parse_posts()?;
        let records: Vec<PostRecord> = posts.into_iter().map(|p| p.record).collect();
        let result = aggregate(&records);

        let tags: Vec<(&str, usize)> = result
            .tags
            .iter()
            .map(|t| (t.tag.as_str(), t.count))
            .collect();
        assert_eq!(tags, vec![("astro", 2), ("rust", 1), ("web-dev", 1)]);

        let categories: Vec<(&str, &str, usize)> = result
            .categories
            .iter()
            .map(|c| (c.slug.as_str(), c.name.as_str(), c.count))
            .collect();
        assert_eq!(categories, vec![("tech", "Tech", 2)]);
        Ok(())
    }

    #[test]
    fn test_frontmatter_indices() -> Result<()> {
        assert!(matches!(
            frontmatter_indices("title: x\n---\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            frontmatter_indices("---\ntitle: x\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
        let input = "---\ntitle: a---b\n---\nbody";
        let (start, stop) = frontmatter_indices(input).unwrap();
        assert_eq!(&input[start..stop], "\ntitle: a---b\n");
        assert_eq!(frontmatter_indices("---\n---\n").unwrap(), (3, 4));
        assert_eq!(frontmatter_indices("---\n---").unwrap(), (3, 4));

        // a line that merely starts with `---` does not close the block
        let input = "---\nbody: |\n  ----\n---x\n  more\n---\ntext";
        let (start, stop) = frontmatter_indices(input)?;
        assert_eq!(&input[start..stop], "\nbody: |\n  ----\n---x\n  more\n");
        let input = "---\ntitle: x\n----\nbody";
        assert!(matches!(
            frontmatter_indices(input),
            Err(Error::FrontmatterMissingEndFence)
        ));

        let input = "---\r\ntitle: x\r\n---\r\nbody";
        let (start, stop) = frontmatter_indices(input)?;
        assert_eq!(&input[start..stop], "\r\ntitle: x\r\n");
        Ok(())
    }

    #[test]
    fn test_missing_fence_is_annotated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.md"), "no frontmatter").unwrap();
        let err = Parser::new(dir.path()).parse_posts().unwrap_err();
        assert!(matches!(err, Error::Annotated(_, _)));
        assert!(err.to_string().contains("bad.md"));
        assert!(err.to_string().ends_with("Post must begin with `---`"));
    }

    #[test]
    fn test_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a post").unwrap();
        std::fs::write(dir.path().join("empty.md"), "---\n---\n").unwrap();
        let posts = Parser::new(dir.path()).parse_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].record, PostRecord::default());
    }
}
