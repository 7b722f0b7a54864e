use syn::{Error, Ident};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Delete,
    Put,
    Head,
    Options,
    Trace,
    Patch,
}

impl TryFrom<&Ident> for Method {
    type Error = Error;

    fn try_from(ident: &Ident) -> Result<Self, Self::Error> {
        Ok(match ident.to_string().to_lowercase().as_ref() {
            "get" => Method::Get,
            "post" => Method::Post,
            "delete" => Method::Delete,
            "put" => Method::Put,
            "head" => Method::Head,
            "options" => Method::Options,
            "trace" => Method::Trace,
            "patch" => Method::Patch,
            _ => {
                return Err(Error::new(
                    ident.span(),
                    "verb must be get, post, delete, put, head, options, trace or patch",
                ));
            }
        })
    }
}

impl quote::ToTokens for Method {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let krate = crate::util::code_routes_crate();
        tokens.extend(match self {
            Method::Get => quote::quote! { #krate::Verb::Get },
            Method::Post => quote::quote! { #krate::Verb::Post },
            Method::Delete => quote::quote! { #krate::Verb::Delete },
            Method::Put => quote::quote! { #krate::Verb::Put },
            Method::Head => quote::quote! { #krate::Verb::Head },
            Method::Options => quote::quote! { #krate::Verb::Options },
            Method::Trace => quote::quote! { #krate::Verb::Trace },
            Method::Patch => quote::quote! { #krate::Verb::Patch },
        })
    }
}
