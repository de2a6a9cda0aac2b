//! Procedural macros for eapi.
//!
//! `#[derive(EapiResponse)]` turns any `serde::Deserialize` type into a
//! result container for a batched request:
//!
//! ```rust,ignore
//! #[derive(Default, Deserialize, EapiResponse)]
//! #[eapi(command = "show version")]
//! #[serde(rename_all = "camelCase")]
//! struct ShowVersion {
//!     model_name: String,
//!     version: String,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

/// Implement `eapi::EapiResponse` using serde for the field mapping.
///
/// Requires `#[eapi(command = "...")]` naming the CLI command the type
/// answers.
#[proc_macro_derive(EapiResponse, attributes(eapi))]
pub fn derive_eapi_response(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let command = command_attr(input)?;
    if command.value().trim().is_empty() {
        return Err(syn::Error::new_spanned(
            &command,
            "eapi command must not be empty",
        ));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::eapi::EapiResponse for #name #ty_generics #where_clause {
            fn command(&self) -> &str {
                #command
            }

            fn accept(
                &mut self,
                value: ::eapi::Value,
            ) -> ::std::result::Result<(), ::eapi::response::DecodeError> {
                ::eapi::response::decode_into(self, value)
            }
        }
    })
}

/// Find `command = "..."` inside `#[eapi(...)]`.
fn command_attr(input: &DeriveInput) -> syn::Result<LitStr> {
    let mut command = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("eapi")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("command") {
                command = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported eapi attribute, expected `command`"))
            }
        })?;
    }

    command.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "missing #[eapi(command = \"...\")] attribute",
        )
    })
}
