use crate::{method::Method, param::FromRoute, route::Route, util};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    Attribute, FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta, Pat, PatType,
    PathArguments, Result, Type, Visibility, ext::IdentExt, spanned::Spanned,
};

/// Parsed `#[action(...)]`
#[derive(Debug, Default)]
struct ActionAttr {
    name: Option<LitStr>,
    custom_route: Option<Route>,
    absolute: bool,
    verbs: Vec<Method>,
    require_route_parameters: bool,
}

impl ActionAttr {
    fn parse(attr: &Attribute) -> Result<Self> {
        let mut parsed = Self::default();

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                parsed.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("custom_route") {
                parsed.custom_route = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("absolute") {
                parsed.absolute = true;
            } else if meta.path.is_ident("require_route_parameters") {
                parsed.require_route_parameters = true;
            } else if meta.path.is_ident("verbs") {
                meta.parse_nested_meta(|verb| {
                    let ident = verb.path.require_ident()?;
                    let method = Method::try_from(ident)?;
                    if parsed.verbs.contains(&method) {
                        return Err(verb.error("duplicate verb"));
                    }
                    parsed.verbs.push(method);
                    Ok(())
                })?;
            } else {
                return Err(meta.error("unknown action attribute"));
            }
            Ok(())
        })?;

        if parsed.absolute && parsed.custom_route.is_none() {
            return Err(syn::Error::new(
                attr.span(),
                "absolute requires a custom_route",
            ));
        }

        Ok(parsed)
    }
}

// ----------------------------------------------------------------------------

const PARAMETER_ATTRIBUTES: [&str; 3] = ["from_route", "from_body", "from_query"];

/// Removes every attribute named `name`
fn take_attributes(attrs: &mut Vec<Attribute>, name: &str) -> Vec<Attribute> {
    let (taken, kept) = attrs.drain(..).partition(|attr| attr.path().is_ident(name));
    *attrs = kept;
    taken
}

fn require_flag(attr: &Attribute) -> Result<()> {
    match &attr.meta {
        Meta::Path(_) => Ok(()),
        meta => Err(syn::Error::new(meta.span(), "this attribute takes no arguments")),
    }
}

/// `Option<T>` is `T`, optional
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first() {
        Some(GenericArgument::Type(inner)) if arguments.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// Strips the helper attributes of a parameter, and returns its
/// `ParameterDescriptor`
fn parameter(krate: &TokenStream2, arg: &mut PatType) -> Result<TokenStream2> {
    let [from_route, from_body, from_query] =
        PARAMETER_ATTRIBUTES.map(|name| take_attributes(&mut arg.attrs, name));

    if from_route.len() + from_body.len() + from_query.len() > 1 {
        return Err(syn::Error::new(
            arg.span(),
            "a parameter is bound from a single source",
        ));
    }

    let name = match &*arg.pat {
        Pat::Ident(pat) => pat.ident.unraw().to_string(),
        other => {
            return Err(syn::Error::new(
                other.span(),
                "action parameters must be plain identifiers",
            ));
        }
    };

    if let Type::Reference(reference) = &*arg.ty {
        return Err(syn::Error::new(
            reference.span(),
            "action parameters must be owned types",
        ));
    }

    let (ty, optional) = match option_inner(&arg.ty) {
        Some(inner) => (inner, quote! { .optional() }),
        None => (&*arg.ty, TokenStream2::new()),
    };

    let source = if let Some(attr) = from_route.first() {
        FromRoute::from_attribute(attr)?.builder_calls()
    } else if let Some(attr) = from_body.first() {
        require_flag(attr)?;
        quote! { .from_body() }
    } else if let Some(attr) = from_query.first() {
        require_flag(attr)?;
        quote! { .from_query() }
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        #krate::ParameterDescriptor::new::<#ty>(#name) #optional #source
    })
}

/// Generates the `ActionDescriptor` of a method, `None` if the method is
/// not an action.
fn action(krate: &TokenStream2, method: &mut ImplItemFn) -> Result<Option<TokenStream2>> {
    let non_action = take_attributes(&mut method.attrs, "non_action");
    let action_attrs = take_attributes(&mut method.attrs, "action");

    // Only public methods taking self are actions
    let eligible = matches!(method.vis, Visibility::Public(_)) && method.sig.receiver().is_some();
    if !eligible {
        for input in method.sig.inputs.iter_mut() {
            if let FnArg::Typed(arg) = input {
                for name in PARAMETER_ATTRIBUTES {
                    take_attributes(&mut arg.attrs, name);
                }
            }
        }
        return match non_action.first().or(action_attrs.first()) {
            Some(attr) => Err(syn::Error::new(
                attr.span(),
                "only public methods with a self receiver can be actions",
            )),
            None => Ok(None),
        };
    }

    if let Some(attr) = non_action.first() {
        require_flag(attr)?;
        if let Some(action_attr) = action_attrs.first() {
            return Err(syn::Error::new(
                action_attr.span(),
                "non_action methods cannot have an action attribute",
            ));
        }
    }
    if let Some(attr) = action_attrs.get(1) {
        return Err(syn::Error::new(attr.span(), "duplicate action attribute"));
    }

    let parameters = method
        .sig
        .inputs
        .iter_mut()
        .filter_map(|input| match input {
            FnArg::Typed(arg) => Some(parameter(krate, arg)),
            FnArg::Receiver(_) => None,
        })
        .collect::<Result<Vec<_>>>()?;
    let action_attr = action_attrs
        .first()
        .map(ActionAttr::parse)
        .transpose()?
        .unwrap_or_default();

    let method_name = method.sig.ident.unraw().to_string();
    let name = action_attr
        .name
        .unwrap_or_else(|| LitStr::new(&util::action_name(&method.sig.ident), Span::call_site()));
    let custom_route = action_attr
        .custom_route
        .map(|route| quote! { .custom_route(#route) });
    let absolute = action_attr.absolute.then(|| quote! { .absolute() });
    let verbs = (!action_attr.verbs.is_empty()).then(|| {
        let verbs = &action_attr.verbs;
        quote! { .verbs([#(#verbs),*]) }
    });
    let require_route_parameters = action_attr
        .require_route_parameters
        .then(|| quote! { .require_route_parameters() });
    let non_action = (!non_action.is_empty()).then(|| quote! { .non_action() });

    Ok(Some(quote! {
        #krate::ActionDescriptor::new(#method_name)
            .name(#name)
            #( .parameter(#parameters) )*
            #custom_route
            #absolute
            #verbs
            #require_route_parameters
            #non_action
    }))
}

pub fn try_expand(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    let krate = util::code_routes_crate();

    if !attr.is_empty() {
        return Err(syn::Error::new(
            Span::call_site(),
            "#[actions] takes no arguments",
        ));
    }

    let mut block = syn::parse::<ItemImpl>(item)?;

    // Do not accept generics
    if let Some(param) = block.generics.params.first() {
        return Err(syn::Error::new(param.span(), "controller should not be generic"));
    }
    if let Some((_, path, _)) = &block.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[actions] must be put on an inherent impl block",
        ));
    }

    let mut actions = Vec::new();
    for item in block.items.iter_mut() {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        // Keep the conditional compilation of the method on its descriptor
        let conditional = method
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .cloned()
            .collect::<Vec<_>>();

        if let Some(action) = action(&krate, method)? {
            actions.push(quote! {
                #(#conditional)*
                actions.push(#action);
            });
        }
    }

    let self_ty = &block.self_ty;

    Ok(quote! {
        #block

        impl #krate::Actions for #self_ty {
            fn actions() -> ::std::vec::Vec<#krate::ActionDescriptor> {
                #[allow(unused_mut)]
                let mut actions = ::std::vec::Vec::new();
                #(#actions)*
                actions
            }
        }
    }
    .into())
}
