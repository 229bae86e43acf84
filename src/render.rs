//! Renders an [`Aggregate`] for the listing pages that consume it: as a
//! plain-text report, as YAML, or through a user-provided [`gtmpl`]
//! template. Templates see the value described in [`crate::value`].

use crate::aggregate::Aggregate;
use gtmpl::Value;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// The built-in output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Text,
    Yaml,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Format, String> {
        match s {
            "text" => Ok(Format::Text),
            "yaml" => Ok(Format::Yaml),
            _ => Err(format!("unknown format `{}`", s)),
        }
    }
}

/// Writes `aggregate` to `w` in one of the built-in formats.
pub fn write_aggregate<W: Write>(aggregate: &Aggregate, format: Format, mut w: W) -> Result<()> {
    match format {
        Format::Text => {
            writeln!(w, "Tags")?;
            for t in &aggregate.tags {
                writeln!(w, "  {}\t{}", t.tag, t.count)?;
            }
            writeln!(w, "Categories")?;
            for c in &aggregate.categories {
                writeln!(w, "  {} ({})\t{}", c.name, c.slug, c.count)?;
            }
        }
        Format::Yaml => serde_yaml::to_writer(w, aggregate)?,
    }
    Ok(())
}

/// Concatenates `template_files`, executes the result as a template against
/// `aggregate`, and writes the output to `w`.
pub fn write_template<P, W>(
    aggregate: &Aggregate,
    template_files: impl Iterator<Item = P>,
    mut w: W,
) -> Result<()>
where
    P: AsRef<Path>,
    W: Write,
{
    let contents = load_templates(template_files)?;
    let output = gtmpl::template(&contents, Value::from(aggregate))
        .map_err(|e| Error::Template(e.to_string()))?;
    w.write_all(output.as_bytes())?;
    Ok(())
}

// Loads the template file contents and concatenates them.
fn load_templates<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<String> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }
    Ok(contents)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for rendering an aggregate.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing or executing a template.
    Template(String),

    /// Returned for errors serializing YAML output.
    Yaml(serde_yaml::Error),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::Template(err) => write!(f, "Rendering template: {}", err),
            Error::Yaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::Template(_) => None,
            Error::Yaml(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts [`io::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts [`serde_yaml::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aggregate::{CategorySummary, TagCount};

    fn sample() -> Aggregate {
        Aggregate {
            tags: vec![
                TagCount {
                    tag: "css".to_owned(),
                    count: 1,
                },
                TagCount {
                    tag: "js".to_owned(),
                    count: 2,
                },
            ],
            categories: vec![CategorySummary {
                slug: "web".to_owned(),
                name: "Web".to_owned(),
                count: 1,
            }],
        }
    }

    #[test]
    fn test_text() -> Result<()> {
        let mut out = Vec::new();
        write_aggregate(&sample(), Format::Text, &mut out)?;
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Tags\n  css\t1\n  js\t2\nCategories\n  Web (web)\t1\n"
        );
        Ok(())
    }

    #[test]
    fn test_yaml() -> Result<()> {
        let mut out = Vec::new();
        write_aggregate(&sample(), Format::Yaml, &mut out)?;
        let value: serde_yaml::Value = serde_yaml::from_slice(&out)?;
        assert_eq!(value["tags"][1]["tag"].as_str(), Some("js"));
        assert_eq!(value["tags"][1]["count"].as_u64(), Some(2));
        assert_eq!(value["categories"][0]["name"].as_str(), Some("Web"));
        Ok(())
    }

    #[test]
    fn test_template() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("listing.tmpl");
        std::fs::write(
            &path,
            "{{range .tags}}<a href=\"/tags/{{.tag}}\">{{.tag}}</a>{{end}}",
        )?;
        let mut out = Vec::new();
        write_template(&sample(), std::iter::once(&path), &mut out)?;
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"<a href="/tags/css">css</a>"#));
        assert!(out.contains(r#"<a href="/tags/js">js</a>"#));
        Ok(())
    }

    #[test]
    fn test_invalid_template() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.tmpl");
        std::fs::write(&path, "{{range .tags}}")?;
        let err = write_template(&sample(), std::iter::once(&path), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        Ok(())
    }

    #[test]
    fn test_missing_template() {
        let err = write_template(
            &sample(),
            std::iter::once(Path::new("/nonexistent/listing.tmpl")),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::OpenTemplateFile { .. }));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("yaml".parse::<Format>(), Ok(Format::Yaml));
        assert!("xml".parse::<Format>().is_err());
    }
}
