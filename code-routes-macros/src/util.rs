use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Ident, ext::IdentExt};

// Utility method to find the proper name of the `code_routes` crate
pub(crate) fn code_routes_crate() -> TokenStream {
    match crate_name("code-routes") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        // `code_routes` is also an alias of the crate inside itself
        Ok(FoundCrate::Itself) | Err(_) => quote!(::code_routes),
    }
}

/// `list_all` is the `ListAll` action
pub(crate) fn action_name(ident: &Ident) -> String {
    ident
        .unraw()
        .to_string()
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect()
}
