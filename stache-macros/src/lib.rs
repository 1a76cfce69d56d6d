//! Build-time checked templates for `stache`.
//!
//! Both macros run the real template parser while the crate is compiled, so a
//! syntax error in a template is reported by `cargo build` rather than at the
//! first render.

use std::path::Path;

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, ExprArray, ExprLit, Lit, LitStr, MetaNameValue, Token, parse_macro_input};
use walkdir::WalkDir;

const PARTIAL_EXTENSION: &str = "hbs";

struct TemplateInput {
    source: LitStr,
    known_helpers: Vec<LitStr>,
    known_helpers_only: Option<bool>,
    string_params: Option<bool>,
    data: Option<bool>,
}

fn bool_option(pair: &MetaNameValue) -> syn::Result<bool> {
    match &pair.value {
        Expr::Lit(ExprLit { lit: Lit::Bool(b), .. }) => Ok(b.value),
        other => Err(syn::Error::new_spanned(other, "expected `true` or `false`")),
    }
}

fn names_option(pair: &MetaNameValue) -> syn::Result<Vec<LitStr>> {
    let Expr::Array(ExprArray { elems, .. }) = &pair.value else {
        return Err(syn::Error::new_spanned(
            &pair.value,
            "expected an array of helper names",
        ));
    };
    elems
        .iter()
        .map(|e| match e {
            Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.clone()),
            other => Err(syn::Error::new_spanned(other, "expected a string literal")),
        })
        .collect()
}

impl Parse for TemplateInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let source: LitStr = input.parse()?;
        let mut parsed = TemplateInput {
            source,
            known_helpers: Vec::new(),
            known_helpers_only: None,
            string_params: None,
            data: None,
        };
        if input.is_empty() {
            return Ok(parsed);
        }
        input.parse::<Token![,]>()?;
        let pairs = Punctuated::<MetaNameValue, Token![,]>::parse_terminated(input)?;
        for pair in &pairs {
            let Some(key) = pair.path.get_ident() else {
                return Err(syn::Error::new_spanned(&pair.path, "expected an option name"));
            };
            match key.to_string().as_str() {
                "known_helpers" => parsed.known_helpers = names_option(pair)?,
                "known_helpers_only" => parsed.known_helpers_only = Some(bool_option(pair)?),
                "string_params" => parsed.string_params = Some(bool_option(pair)?),
                "data" => parsed.data = Some(bool_option(pair)?),
                other => {
                    return Err(syn::Error::new_spanned(
                        key,
                        format!("unknown template option `{other}`"),
                    ));
                }
            }
        }
        Ok(parsed)
    }
}

fn check_syntax(lit: &LitStr, source: &str, origin: &str) -> Result<(), syn::Error> {
    stache_parser::parse(source)
        .map(|_| ())
        .map_err(|e| syn::Error::new(lit.span(), format!("{origin}: {e}")))
}

/// Compiles a template literal, checking its syntax at build time.
///
/// ```ignore
/// let t = stache::template!("{{#each people}}{{name}} {{/each}}", known_helpers_only = true);
/// ```
#[proc_macro]
pub fn template(input: TokenStream) -> TokenStream {
    let TemplateInput {
        source,
        known_helpers,
        known_helpers_only,
        string_params,
        data,
    } = parse_macro_input!(input as TemplateInput);

    if let Err(e) = check_syntax(&source, &source.value(), "invalid template") {
        return e.to_compile_error().into();
    }

    let known_helpers_only = known_helpers_only.map(|b| quote! { .known_helpers_only(#b) });
    let string_params = string_params.map(|b| quote! { .string_params(#b) });
    let data = data.map(|b| quote! { .data(#b) });

    let expanded = quote! {
        ::stache::Template::compile(
            #source,
            &::stache::CompileOptions::default()
                #(.known_helper(#known_helpers, true))*
                #known_helpers_only
                #string_params
                #data,
        )
        .expect("template syntax is verified when the macro expands")
    };
    TokenStream::from(expanded)
}

/// Partial name for a file: its path below the root, `/` separated, without extension
fn partial_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Embeds every `.hbs` file below a directory as a partial.
///
/// Returns a `stache::PartialRegistry`. Each file is named by its path
/// relative to the directory, so `templates/people/row.hbs` registers as
/// `people/row` when invoked as `partials!("templates")`.
#[proc_macro]
pub fn partials(input: TokenStream) -> TokenStream {
    let dir_lit = parse_macro_input!(input as LitStr);
    let dir_str = dir_lit.value();

    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => dir,
        Err(_) => {
            return syn::Error::new(dir_lit.span(), "CARGO_MANIFEST_DIR not set")
                .to_compile_error()
                .into();
        }
    };
    let root_path = Path::new(&manifest_dir).join(&dir_str);

    if !root_path.is_dir() {
        return syn::Error::new(
            dir_lit.span(),
            format!("Directory not found: {:?}", root_path),
        )
        .to_compile_error()
        .into();
    }

    let mut registrations: Vec<proc_macro2::TokenStream> = Vec::new();
    for entry in WalkDir::new(&root_path).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != PARTIAL_EXTENSION) {
            continue;
        }
        let Some(name) = partial_name(&root_path, path) else {
            continue;
        };
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                return syn::Error::new(dir_lit.span(), format!("Failed to read {:?}: {e}", path))
                    .to_compile_error()
                    .into();
            }
        };
        if let Err(e) = check_syntax(&dir_lit, &content, &format!("invalid partial `{name}`")) {
            return e.to_compile_error().into();
        }

        let path_str = path.to_string_lossy().into_owned();
        registrations.push(quote! {
            registry.register_source(#name, include_str!(#path_str));
        });
    }

    let expanded = quote! {
        {
            let mut registry = ::stache::PartialRegistry::new();
            #(#registrations)*
            registry
        }
    };
    TokenStream::from(expanded)
}
