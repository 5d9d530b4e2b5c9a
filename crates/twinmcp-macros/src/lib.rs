//! `#[prompt]` and `#[tool]` attribute macros.
//!
//! Each macro turns a plain function into an MCP handler. For a function
//!
//! ```ignore
//! #[prompt(description = "Greet someone", default(style = "casual"))]
//! fn greet(name: String, style: String) -> Vec<PromptMessage> { ... }
//! ```
//!
//! the macro emits:
//!
//! - a parameter envelope `GreetArgs` deserialized from the incoming JSON
//!   argument object (optional parameters become `Option<T>` fields);
//! - a handler struct `Greet` implementing the handler trait. Its invocation
//!   rejects unknown keys (first offender reported), asserts required keys,
//!   deserializes the envelope, and dispatches by presence over the optional
//!   parameters: a match with exactly 2^N arms, each calling `greet`
//!   directly with absent defaulted parameters replaced by their declared
//!   default expression and absent `Option` parameters replaced by `None`.
//!
//! A parameter is required iff it is not `Option<T>` and carries no
//! `default(...)` entry. Call-site argument order always matches the source
//! declaration order. The dispatch tree doubles per optional parameter;
//! correctness is chosen over generated-code size.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{
    parenthesized, parse_macro_input, Expr, FnArg, Ident, ItemFn, LitStr, Pat, Token, Type,
};

/// Marks a function as an MCP prompt.
///
/// Attribute arguments: `name = "..."`, `description = "..."`,
/// `default(param = expr, ...)`. The function must return a type convertible
/// via `IntoPromptResult` (e.g. `Vec<PromptMessage>`).
#[proc_macro_attribute]
pub fn prompt(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let function = parse_macro_input!(item as ItemFn);
    expand(HandlerKind::Prompt, &args, &function)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Marks a function as an MCP tool.
///
/// Attribute arguments: `name = "..."`, `description = "..."`,
/// `default(param = expr, ...)`. The function must return a type convertible
/// via `IntoCallToolResult` (e.g. `String` or `Vec<Content>`).
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let function = parse_macro_input!(item as ItemFn);
    expand(HandlerKind::Tool, &args, &function)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

#[derive(Clone, Copy, PartialEq)]
enum HandlerKind {
    Prompt,
    Tool,
}

/// Parsed attribute arguments.
struct MacroArgs {
    name: Option<String>,
    description: Option<String>,
    defaults: Vec<(Ident, Expr)>,
}

impl Parse for MacroArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = MacroArgs {
            name: None,
            description: None,
            defaults: Vec::new(),
        };

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            if key == "default" {
                let content;
                parenthesized!(content in input);
                let entries: Punctuated<DefaultEntry, Token![,]> =
                    content.parse_terminated(DefaultEntry::parse, Token![,])?;
                for entry in entries {
                    args.defaults.push((entry.name, entry.value));
                }
            } else if key == "name" {
                input.parse::<Token![=]>()?;
                let value: LitStr = input.parse()?;
                args.name = Some(value.value());
            } else if key == "description" {
                input.parse::<Token![=]>()?;
                let value: LitStr = input.parse()?;
                args.description = Some(value.value());
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    "expected `name`, `description`, or `default(...)`",
                ));
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

struct DefaultEntry {
    name: Ident,
    value: Expr,
}

impl Parse for DefaultEntry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let value: Expr = input.parse()?;
        Ok(DefaultEntry { name, value })
    }
}

/// One parameter of the target function.
struct Param {
    ident: Ident,
    ty: Type,
    kind: ParamKind,
}

enum ParamKind {
    /// Not nullable, no default: must be present.
    Required,
    /// `Option<T>`: absent means `None`.
    Nullable,
    /// Declared default expression: absent means the default.
    Defaulted(Expr),
}

impl Param {
    fn is_optional(&self) -> bool {
        !matches!(self.kind, ParamKind::Required)
    }
}

/// Returns true for `Option<...>` types.
fn is_option(ty: &Type) -> bool {
    if let Type::Path(path) = ty {
        if let Some(last) = path.path.segments.last() {
            return last.ident == "Option";
        }
    }
    false
}

/// Maps a Rust parameter type to its JSON schema type name.
fn json_type_name(ty: &Type) -> &'static str {
    let ty = match ty {
        Type::Path(path) => {
            let last = match path.path.segments.last() {
                Some(last) => last,
                None => return "string",
            };
            if last.ident == "Option" {
                if let syn::PathArguments::AngleBracketed(args) = &last.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                        return json_type_name(inner);
                    }
                }
                return "string";
            }
            last.ident.to_string()
        }
        _ => return "string",
    };

    match ty.as_str() {
        "bool" => "boolean",
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128"
        | "usize" | "f32" | "f64" => "number",
        // Strings and enums-as-strings.
        _ => "string",
    }
}

/// Converts snake_case to PascalCase.
fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn collect_params(function: &ItemFn, args: &MacroArgs) -> syn::Result<Vec<Param>> {
    let mut params = Vec::new();

    for input in &function.sig.inputs {
        let typed = match input {
            FnArg::Typed(typed) => typed,
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "handler functions cannot take self",
                ));
            }
        };
        let ident = match typed.pat.as_ref() {
            Pat::Ident(pat) => pat.ident.clone(),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "handler parameters must be plain identifiers",
                ));
            }
        };

        let default = args
            .defaults
            .iter()
            .find(|(name, _)| *name == ident)
            .map(|(_, expr)| expr.clone());

        let kind = match default {
            Some(expr) => ParamKind::Defaulted(expr),
            None if is_option(&typed.ty) => ParamKind::Nullable,
            None => ParamKind::Required,
        };

        params.push(Param {
            ident,
            ty: (*typed.ty).clone(),
            kind,
        });
    }

    // Reject defaults that name no parameter.
    for (name, _) in &args.defaults {
        if !params.iter().any(|p| p.ident == *name) {
            return Err(syn::Error::new(
                name.span(),
                format!("default names unknown parameter `{name}`"),
            ));
        }
    }

    Ok(params)
}

/// Builds the 2^N presence-dispatch match over the optional parameters.
///
/// Every arm is a direct invocation of the target function with arguments in
/// declaration order.
fn dispatch_tree(function_name: &Ident, params: &[Param]) -> TokenStream2 {
    let optionals: Vec<&Param> = params.iter().filter(|p| p.is_optional()).collect();

    if optionals.is_empty() {
        let call_args = params.iter().map(|p| {
            let ident = &p.ident;
            quote! { #ident }
        });
        return quote! { #function_name(#(#call_args),*) };
    }

    let scrutinee = {
        let idents = optionals.iter().map(|p| &p.ident);
        quote! { (#(#idents),*,) }
    };

    let arm_count: usize = 1 << optionals.len();
    let arms = (0..arm_count).map(|mask| {
        let patterns = optionals.iter().enumerate().map(|(i, p)| {
            let ident = &p.ident;
            if mask & (1 << i) != 0 {
                quote! { ::core::option::Option::Some(#ident) }
            } else {
                quote! { ::core::option::Option::None }
            }
        });

        let call_args = params.iter().map(|p| {
            let ident = &p.ident;
            match &p.kind {
                ParamKind::Required => quote! { #ident },
                ParamKind::Nullable | ParamKind::Defaulted(_) => {
                    let index = optionals
                        .iter()
                        .position(|o| o.ident == p.ident)
                        .unwrap_or_default();
                    let present = mask & (1 << index) != 0;
                    match (&p.kind, present) {
                        (ParamKind::Nullable, true) => {
                            quote! { ::core::option::Option::Some(#ident) }
                        }
                        (ParamKind::Nullable, false) => quote! { ::core::option::Option::None },
                        (ParamKind::Defaulted(_), true) => quote! { #ident },
                        (ParamKind::Defaulted(expr), false) => {
                            quote! { ::core::convert::Into::into(#expr) }
                        }
                        (ParamKind::Required, _) => unreachable!(),
                    }
                }
            }
        });

        quote! { (#(#patterns),*,) => #function_name(#(#call_args),*) }
    });

    quote! {
        match #scrutinee {
            #(#arms),*
        }
    }
}

fn expand(kind: HandlerKind, args: &MacroArgs, function: &ItemFn) -> syn::Result<TokenStream2> {
    if function.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            &function.sig,
            "handler functions must be synchronous",
        ));
    }

    let params = collect_params(function, args)?;

    let fn_ident = &function.sig.ident;
    let vis = &function.vis;
    let wire_name = args.name.clone().unwrap_or_else(|| fn_ident.to_string());
    let handler_ident = format_ident!("{}", to_pascal_case(&fn_ident.to_string()));
    let envelope_ident = format_ident!("{}Args", handler_ident);

    // Parameter envelope: required fields keep their type, optional fields
    // become Option<T> accepting absent keys.
    let envelope_fields = params.iter().map(|p| {
        let ident = &p.ident;
        let ty = &p.ty;
        match &p.kind {
            ParamKind::Required => quote! { #ident: #ty },
            ParamKind::Nullable => quote! {
                #[serde(default)]
                #ident: #ty
            },
            ParamKind::Defaulted(_) => quote! {
                #[serde(default)]
                #ident: ::core::option::Option<#ty>
            },
        }
    });

    let known_names: Vec<String> = params.iter().map(|p| p.ident.to_string()).collect();
    let required_names: Vec<String> = params
        .iter()
        .filter(|p| !p.is_optional())
        .map(|p| p.ident.to_string())
        .collect();

    let field_idents: Vec<&Ident> = params.iter().map(|p| &p.ident).collect();
    let dispatch = dispatch_tree(fn_ident, &params);

    let description = match &args.description {
        Some(text) => quote! { ::core::option::Option::Some(#text.to_string()) },
        None => quote! { ::core::option::Option::None },
    };

    let validate_and_invoke = quote! {
        const KNOWN: &[&str] = &[#(#known_names),*];
        for key in arguments.keys() {
            if !KNOWN.contains(&key.as_str()) {
                return ::core::result::Result::Err(
                    ::twinmcp::McpError::unknown_argument(key.as_str()),
                );
            }
        }
        #(
            if !arguments.contains_key(#required_names) {
                return ::core::result::Result::Err(
                    ::twinmcp::McpError::missing_required_argument(#required_names),
                );
            }
        )*
        let envelope: #envelope_ident = ::twinmcp::serde_json::from_value(
            ::twinmcp::serde_json::Value::Object(arguments.clone()),
        )
        .map_err(|e| ::twinmcp::McpError::invalid_params(e.to_string()))?;
        let #envelope_ident { #(#field_idents),* } = envelope;
        let output = #dispatch;
    };

    let handler_impl = match kind {
        HandlerKind::Prompt => {
            let argument_defs = params.iter().map(|p| {
                let name = p.ident.to_string();
                let required = !p.is_optional();
                quote! {
                    ::twinmcp::PromptArgument {
                        name: #name.to_string(),
                        description: ::core::option::Option::None,
                        required: #required,
                    }
                }
            });
            quote! {
                impl ::twinmcp::PromptHandler for #handler_ident {
                    fn definition(&self) -> ::twinmcp::Prompt {
                        ::twinmcp::Prompt {
                            name: #wire_name.to_string(),
                            description: #description,
                            arguments: ::std::vec![#(#argument_defs),*],
                        }
                    }

                    fn get(
                        &self,
                        arguments: &::twinmcp::JsonObject,
                    ) -> ::twinmcp::McpResult<::std::vec::Vec<::twinmcp::PromptMessage>> {
                        #validate_and_invoke
                        ::twinmcp::IntoPromptResult::into_prompt_result(output)
                    }
                }
            }
        }
        HandlerKind::Tool => {
            let property_entries = params.iter().map(|p| {
                let name = p.ident.to_string();
                let ty = json_type_name(&p.ty);
                quote! { #name: { "type": #ty } }
            });
            quote! {
                impl ::twinmcp::ToolHandler for #handler_ident {
                    fn definition(&self) -> ::twinmcp::Tool {
                        ::twinmcp::Tool {
                            name: #wire_name.to_string(),
                            description: #description,
                            input_schema: ::twinmcp::serde_json::json!({
                                "type": "object",
                                "properties": { #(#property_entries),* },
                                "required": [#(#required_names),*],
                            }),
                        }
                    }

                    fn call(
                        &self,
                        arguments: &::twinmcp::JsonObject,
                    ) -> ::twinmcp::McpResult<::twinmcp::CallToolResult> {
                        #validate_and_invoke
                        ::twinmcp::IntoCallToolResult::into_call_tool_result(output)
                    }
                }
            }
        }
    };

    Ok(quote! {
        #function

        #[derive(::twinmcp::serde::Deserialize)]
        #[serde(crate = "twinmcp::serde")]
        #[allow(dead_code)]
        struct #envelope_ident {
            #(#envelope_fields),*
        }

        /// Generated handler for the annotated function.
        #[derive(Debug, Clone, Copy)]
        #vis struct #handler_ident;

        #handler_impl
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_conversion() {
        assert_eq!(to_pascal_case("greet"), "Greet");
        assert_eq!(to_pascal_case("explain_math"), "ExplainMath");
        assert_eq!(to_pascal_case("std_dev"), "StdDev");
    }

    #[test]
    fn option_detection() {
        let ty: Type = syn::parse_str("Option<String>").unwrap();
        assert!(is_option(&ty));
        let ty: Type = syn::parse_str("String").unwrap();
        assert!(!is_option(&ty));
    }

    #[test]
    fn json_type_mapping() {
        let string: Type = syn::parse_str("String").unwrap();
        assert_eq!(json_type_name(&string), "string");
        let number: Type = syn::parse_str("f64").unwrap();
        assert_eq!(json_type_name(&number), "number");
        let boolean: Type = syn::parse_str("bool").unwrap();
        assert_eq!(json_type_name(&boolean), "boolean");
        let optional: Type = syn::parse_str("Option<i64>").unwrap();
        assert_eq!(json_type_name(&optional), "number");
    }
}
