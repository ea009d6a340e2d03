use chrono::NaiveDate;
use markdown::{CompileOptions, Options};
use spdlog::{debug, warn};

use crate::bundle::{file_name, Bundle};
use crate::content::Post;
use crate::error::{LoadError, ParseError};
use crate::text_utils::parse_date;

pub const WRITING_DIR: &str = "writing";
pub const POST_SUFFIX: &str = ".md";

const TITLE_MARKER: &str = "# ";

/// Reads every `YYYY-MM-DD.md` document below `root`, newest first.
///
/// Files with a name that is not a date are ignored and documents that don't
/// follow the `# Title` layout are skipped; both are only reported in the log.
pub fn load_posts(bundle: &Bundle, root: &str) -> Result<Vec<Post>, LoadError> {
    let mut posts = vec![];

    for (path, raw) in bundle.walk(root) {
        let name = file_name(path);
        let Some(name) = name.strip_suffix(POST_SUFFIX) else {
            continue;
        };

        let date = match parse_date(name) {
            Ok(date) => date,
            Err(e) => {
                warn!("Improperly formatted writing entry, requires yyyy-mm-dd.md, skipping. path={} error={}", path, e);
                continue;
            }
        };

        match parse_post(raw, date) {
            Ok(post) => {
                debug!("Loaded post {} from {}", post.title, path);
                posts.push(post);
            }
            Err(e) => {
                warn!("Failed to parse blog post, skipping. path={} error={}", path, e);
            }
        }
    }

    posts.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(posts)
}

pub fn parse_post(raw: &[u8], date: NaiveDate) -> Result<Post, ParseError> {
    let content = std::str::from_utf8(raw).map_err(|_| ParseError::InvalidUtf8)?;

    let content = content.strip_prefix(TITLE_MARKER).ok_or(ParseError::MissingTitle)?;
    let (title, remaining) = content.split_once('\n').ok_or(ParseError::UnterminatedTitle)?;

    let body = render_markdown(remaining.trim_matches(|c| c == '\n' || c == '\t' || c == ' '))?;

    Ok(Post {
        // CRLF documents leave the carriage return on the title line
        title: title.strip_suffix('\r').unwrap_or(title).to_string(),
        date,
        body,
    })
}

/// GFM to HTML, then through an allow-list sanitizer. Raw HTML is passed
/// through by the markdown pass so the sanitizer decides what survives.
fn render_markdown(md_text: &str) -> Result<String, ParseError> {
    let options = Options {
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::gfm()
        },
        ..Options::gfm()
    };
    let html = match markdown::to_html_with_options(md_text, &options) {
        Ok(x) => x,
        Err(e) => return Err(ParseError::Markdown(e.reason)),
    };
    Ok(ammonia::clean(&html))
}

#[cfg(test)]
mod tests {
    use crate::test_data::{POST_DATA_MD, sample_bundle};

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_post() {
        let post = parse_post(POST_DATA_MD.as_bytes(), day(2022, 4, 2)).unwrap();
        assert_eq!(post.title, "What I learned after 20+ years of software development");
        assert!(post.body.starts_with("<p>How to be a great software engineer?</p>"));
        assert!(post.body.contains("<h2>Non technical</h2>"));
        assert!(!post.body.contains("What I learned"));
    }

    #[test]
    fn test_parse_post_layout_errors() {
        let date = day(2024, 1, 1);
        assert_eq!(parse_post(b"Hello\nBody", date), Err(ParseError::MissingTitle));
        assert_eq!(parse_post(b"#Hello\nBody", date), Err(ParseError::MissingTitle));
        assert_eq!(parse_post(b"# Hello", date), Err(ParseError::UnterminatedTitle));
        assert_eq!(parse_post(&[0xff, 0xfe], date), Err(ParseError::InvalidUtf8));
    }

    #[test]
    fn test_title_is_kept_verbatim() {
        let post = parse_post(b"# Hello\r\nBody", day(2024, 1, 1)).unwrap();
        assert_eq!(post.title, "Hello");

        let post = parse_post(b"# Spaced  \nBody", day(2024, 1, 1)).unwrap();
        assert_eq!(post.title, "Spaced  ");
    }

    #[test]
    fn test_body_is_sanitized() {
        let raw = "# Title\n<script>alert(1)</script>\n\n<b onclick=\"x()\">bold</b> text";
        let post = parse_post(raw.as_bytes(), day(2024, 1, 1)).unwrap();
        assert!(post.body.contains("<b>bold</b> text"));
        assert!(!post.body.contains("script"));
        assert!(!post.body.contains("alert"));
        assert!(!post.body.contains("onclick"));
    }

    #[test]
    fn test_code_spans_stay_escaped() {
        let raw = "# Tags\nUse `<script>alert(1)</script>` carefully";
        let post = parse_post(raw.as_bytes(), day(2024, 1, 1)).unwrap();
        assert!(post.body.contains("<code>&lt;script&gt;alert(1)&lt;/script&gt;</code>"));
        assert_eq!(post.summary(100), "Use &lt;script&gt;alert(1)&lt;/script&gt; carefully");
    }

    #[test]
    fn test_load_posts_newest_first() {
        let bundle = sample_bundle();
        let posts = load_posts(&bundle, WRITING_DIR).unwrap();

        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Later", "Hello"]);
        assert_eq!(posts[0].date, day(2024, 6, 1));
        assert_eq!(posts[1].date, day(2024, 1, 1));
        assert_eq!(posts[1].body.trim(), "<p>Body text</p>");
    }

    #[test]
    fn test_load_posts_skips_bad_entries() {
        let bundle = Bundle::from_files([
            ("writing/2024-01-01.md", "# Hello\nBody text"),
            ("writing/notes.md", "# Not a post\nBody"),
            ("writing/2024-02-01.md", "no title here"),
            ("writing/2024-03-01.txt", "# Wrong suffix\nBody"),
            ("writing/old/2023-05-05.md", "# Nested\nStill a post"),
        ]);
        let posts = load_posts(&bundle, WRITING_DIR).unwrap();

        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Hello", "Nested"]);
    }
}
