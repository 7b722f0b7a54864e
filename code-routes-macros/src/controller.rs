use crate::{param::FromRoute, punctuated_attrs::PunctuatedAttrs};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Field, Ident, Path, Result, ext::IdentExt, spanned::Spanned};

pub fn try_expand(item: TokenStream) -> Result<TokenStream> {
    let krate = crate::util::code_routes_crate();
    let input = syn::parse::<DeriveInput>(item)?;

    // Do not accept generics, a controller is identified by its type
    if let Some(param) = input.generics.params.first() {
        return Err(syn::Error::new(param.span(), "controller should not be generic"));
    }

    let mut extends: Option<Path> = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("controller")) {
        let mut attrs = attr.parse_args::<PunctuatedAttrs<Ident, Path>>()?;
        if let Some(base) = attrs.remove("extends") {
            if extends.replace(base).is_some() {
                return Err(syn::Error::new(attr.span(), "duplicate extends attribute"));
            }
        }
        attrs.deny_remaining()?;
    }

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "only structs can be controllers",
        ));
    };

    // Route properties are the fields marked #[from_route]
    let properties = data
        .fields
        .iter()
        .filter_map(|field| {
            field
                .attrs
                .iter()
                .find(|attr| attr.path().is_ident("from_route"))
                .map(|attr| route_property(&krate, field, attr))
        })
        .collect::<Result<Vec<_>>>()?;

    let base = extends.map(|base| {
        quote! { .extends(<#base as #krate::Controller>::declaration()) }
    });

    let ident = &input.ident;
    let name = ident.unraw().to_string();

    Ok(quote! {
        impl #krate::Controller for #ident {
            fn declaration() -> #krate::ControllerDeclaration {
                #krate::ControllerDeclaration::new::<Self>(#name, ::core::module_path!())
                    #(#properties)*
                    #base
            }
        }
    }
    .into())
}

fn route_property(krate: &TokenStream2, field: &Field, attr: &Attribute) -> Result<TokenStream2> {
    let Some(ident) = &field.ident else {
        return Err(syn::Error::new(
            field.span(),
            "route properties must be named fields",
        ));
    };
    let from_route = FromRoute::from_attribute(attr)?;
    if let Some(default) = &from_route.default {
        return Err(syn::Error::new(
            default.span(),
            "route properties cannot have a default value",
        ));
    }

    let name = ident.unraw().to_string();
    let ty = &field.ty;
    let calls = from_route.builder_calls();

    Ok(quote! {
        .route_property(#krate::ParameterDescriptor::new::<#ty>(#name) #calls)
    })
}
