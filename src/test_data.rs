#[cfg(test)]
use crate::bundle::Bundle;

#[cfg(test)]
pub const POST_DATA_MD: &str = "# What I learned after 20+ years of software development
How to be a great software engineer?

Someone asked me this question today and I didn’t have an answer. After thinking for a while, I came up with a list of what I try to do myself.

## Non technical

### Have a honest image of yourself

You finished university and learned a lot. You solved many hard problems.
It's common to think you are awesome and the smartest person in the planet.
";

#[cfg(test)]
pub fn sample_bundle() -> Bundle {
    Bundle::from_files([
        ("writing/2024-01-01.md", "# Hello\nBody text"),
        ("writing/2024-06-01.md", "# Later\nMore"),
        ("templates/base.html", "<title>{{title}}</title>[{{{body}}}]({{current_year}})"),
        ("templates/index.html", "{{#recent}}<{{title}}>{{/recent}}"),
        ("templates/blog_index.html", "{{#posts}}{{date}} {{title}} {{link}};{{/posts}}"),
        ("templates/blog_post.html", "{{#post}}{{title}}|{{{body}}}{{/post}}"),
        ("templates/about.html", "about me"),
        ("templates/notes.txt", "not a template"),
        ("static/style.css", "body {}"),
    ])
}
