//! Logic-less mustache-style templates.
//!
//! Templates are compiled once into a [`Template`] and rendered against any
//! [`Value`] (or anything `serde::Serialize`) with a set of helpers, partials
//! and an optional data frame supplied through [`RuntimeOptions`].
//!
//! ```rust
//! use stache::{RuntimeOptions, Value};
//! use serde_json::json;
//!
//! let template = stache::template!("Hello {{#each people}}{{name}} {{/each}}");
//! let out = template
//!     .render(&json!({"people": [{"name": "Alan"}, {"name": "Yehuda"}]}).into(), &RuntimeOptions::new())
//!     .unwrap();
//! assert_eq!(out, "Hello Alan Yehuda ");
//! ```
//!
//! `template!` and `partials!` parse their templates while the crate builds,
//! so syntax errors surface as compile errors.

extern crate self as stache;

mod compiler;
mod error;
mod escape;
mod helpers;
mod options;
mod partials;
mod render;
mod value;

pub use compiler::Template;
pub use error::{RenderError, Result};
pub use escape::{escape, escape_value};
pub use helpers::{
    BLOCK_HELPER_MISSING, HELPER_MISSING, Helper, HelperDef, HelperRegistry, HelperResult, Invocation,
};
pub use options::{CompileOptions, RuntimeOptions};
pub use partials::{Partial, PartialFn, PartialRegistry};
pub use stache_macros::{partials, template};
pub use stache_parser::{ParseError, ParseErrorKind};
pub use value::{Map, SafeString, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn basic_usage() {
        let template = crate::template!(r#"<p>{{firstname}} {{lastname}}</p>"#);
        let context = json!({"firstname": "King", "lastname": "Tubby"}).into();
        assert_eq!(
            template.render(&context, &RuntimeOptions::new()).unwrap(),
            "<p>King Tubby</p>"
        );
    }

    #[derive(serde::Serialize)]
    struct Person {
        firstname: String,
        lastname: String,
    }

    #[derive(serde::Serialize)]
    struct Page {
        person: Person,
    }

    #[test]
    fn path_expressions() {
        let template = crate::template!(
            //language=handlebars
            r#"{{person.firstname}} {{person/lastname}}"#
        );
        let page = Page {
            person: Person {
                firstname: "King".to_string(),
                lastname: "Tubby".to_string(),
            },
        };
        assert_eq!(
            template.render_serialize(&page, &RuntimeOptions::new()).unwrap(),
            "King Tubby"
        );
    }

    #[test]
    fn if_else_helper() {
        let template = crate::template!(
            //language=handlebars
            r#"<div>{{#if author}}<h1>{{author.first_name}}</h1>{{else}}<h1>Unknown</h1>{{/if}}</div>"#
        );
        let runtime = RuntimeOptions::new();
        assert_eq!(
            template
                .render(&json!({"author": {"first_name": "King"}}).into(), &runtime)
                .unwrap(),
            //language=html
            r#"<div><h1>King</h1></div>"#
        );
        assert_eq!(
            template.render(&json!({"author": null}).into(), &runtime).unwrap(),
            //language=html
            r#"<div><h1>Unknown</h1></div>"#
        );
    }

    #[test]
    fn triple_brace_is_raw() {
        let template = crate::template!("Hello {{{name}}}! {{name}}");
        let context = json!({"name": "<b>King</b>"}).into();
        assert_eq!(
            template.render(&context, &RuntimeOptions::new()).unwrap(),
            "Hello <b>King</b>! &lt;b&gt;King&lt;/b&gt;"
        );
    }

    #[test]
    fn macro_options() {
        let template = crate::template!(
            "{{hello}} {{cruel world}}",
            known_helpers = ["hello"],
            known_helpers_only = true
        );
        assert!(template.options().known_helpers_only);
        assert!(template.options().is_known("hello"));

        let runtime = RuntimeOptions::new()
            .helper("hello", |_, _| Ok(Value::from("Goodbye")))
            .helper("cruel", |_, _| Ok(Value::from("never called")));
        let context = json!({"cruel": "cruel", "world": "world"}).into();
        assert_eq!(template.render(&context, &runtime).unwrap(), "Goodbye cruel");
    }

    #[test]
    fn macro_string_params_and_data() {
        let template = crate::template!("{{shout is.a}}", string_params = true, data = true);
        let runtime = RuntimeOptions::new()
            .helper("shout", |params, options| {
                let mark = options
                    .data()
                    .and_then(|d| d.get("mark"))
                    .map(Value::render)
                    .unwrap_or_default();
                Ok(Value::from(format!("{}{}", params[0].render().to_uppercase(), mark)))
            })
            .data(Map::from([("mark".to_string(), Value::from("!"))]));
        assert_eq!(template.render(&Value::Null, &runtime).unwrap(), "IS.A!");
    }

    #[test]
    fn helper_formats_number() {
        let template = crate::template!("Price: ${{format price}}");
        let runtime = RuntimeOptions::new().helper("format", |params, _| {
            let price = params.first().and_then(Value::as_f64).unwrap_or_default();
            Ok(Value::from(format!("{price:.2}")))
        });
        let context = json!({"price": 12.2345}).into();
        assert_eq!(template.render(&context, &runtime).unwrap(), "Price: $12.23");
    }

    #[test]
    fn partials_from_directory() {
        let partials = crate::partials!("tests/templates");
        assert_eq!(partials.names(), vec!["dude", "people/row"]);

        let template = crate::template!("{{#each people}}{{> people/row}}{{/each}}|{{> dude}}");
        let runtime = RuntimeOptions::new().with_partials(partials);
        let context = json!({
            "name": "Yehuda",
            "people": [{"name": "Alan", "url": "/alan"}, {"name": "Yehuda", "url": "/yehuda"}]
        })
        .into();
        assert_eq!(
            template.render(&context, &runtime).unwrap(),
            "<a href=\"/alan\">Alan</a>\n<a href=\"/yehuda\">Yehuda</a>\n|Dude: Yehuda\n"
        );
    }

    #[test]
    fn templates_are_send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<Template>();
        check::<HelperRegistry>();
        check::<PartialRegistry>();
        check::<RuntimeOptions>();
    }
}
