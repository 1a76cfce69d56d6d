use serde::Serialize;
use stache::{RuntimeOptions, Value};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(test)]
mod test;

#[derive(Serialize)]
pub struct Todo {
    pub id: u32,
    pub title: String,
    pub url: String,
    pub done: bool,
}

#[derive(Serialize)]
pub struct Page {
    pub owner: String,
    pub todos: Vec<Todo>,
}

pub fn runtime() -> RuntimeOptions {
    RuntimeOptions::new()
        .with_partials(stache::partials!("templates"))
        .helper("link", |params, _| {
            let url = params.first().map(Value::render).unwrap_or_default();
            Ok(Value::safe(format!("<a href=\"{}\">open</a>", stache::escape(&url))))
        })
}

pub fn render_page(page: &Page) -> stache::Result<String> {
    //language=handlebars
    let template = stache::template!(
        r#"<h1>{{owner}}'s list</h1>
<ul>{{#each todos}}
{{> todo/item}}{{else}}<li>Nothing to do</li>{{/each}}
</ul>"#
    );
    template.render_serialize(page, &runtime())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let page = Page {
        owner: "King Tubby".to_string(),
        todos: vec![
            Todo {
                id: 42,
                title: "My Todo".to_string(),
                url: "/todos/42".to_string(),
                done: false,
            },
            Todo {
                id: 43,
                title: "Dub <plates>".to_string(),
                url: "/todos/43?sort=a&b".to_string(),
                done: true,
            },
        ],
    };

    match render_page(&page) {
        Ok(html) => println!("{}", html),
        Err(e) => {
            tracing::error!(error = %e, "failed to render page");
            std::process::exit(1);
        }
    }
}
