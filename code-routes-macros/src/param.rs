//! `#[from_route(...)]`, on route properties and action parameters.

use crate::punctuated_attrs::PunctuatedAttrs;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Ident, Lit, LitStr, Meta, UnOp, spanned::Spanned};

#[derive(Debug, Default)]
pub(crate) struct FromRoute {
    // Token name override
    pub(crate) name: Option<LitStr>,
    // Regex constraint override
    pub(crate) constraint: Option<LitStr>,
    // Default value, as text
    pub(crate) default: Option<LitStr>,
}

impl FromRoute {
    pub(crate) fn from_attribute(attr: &Attribute) -> syn::Result<Self> {
        match &attr.meta {
            Meta::Path(_) => Ok(Self::default()),
            Meta::NameValue(meta) => Err(syn::Error::new(
                meta.span(),
                "expected #[from_route] or #[from_route(key = value, ...)]",
            )),
            Meta::List(_) => {
                let mut attrs = attr.parse_args::<PunctuatedAttrs<Ident, Expr>>()?;

                let name = attrs.remove("name").map(lit_str).transpose()?;
                let constraint = attrs.remove("constraint").map(lit_str).transpose()?;
                let default = attrs.remove("default").map(default_value).transpose()?;
                attrs.deny_remaining()?;

                Ok(Self {
                    name,
                    constraint,
                    default,
                })
            }
        }
    }

    /// Calls on a `ParameterDescriptor`
    pub(crate) fn builder_calls(&self) -> TokenStream {
        let name = self.name.iter();
        let constraint = self.constraint.iter();
        let default = self.default.iter();

        quote! {
            #( .token_name(#name) )*
            #( .constraint(#constraint) )*
            #( .default_value(#default) )*
        }
    }
}

fn lit_str(expr: Expr) -> syn::Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit),
        other => Err(syn::Error::new(other.span(), "expected a string literal")),
    }
}

/// Defaults are kept as text, they are bound with the table's binders
fn default_value(expr: Expr) -> syn::Result<LitStr> {
    let span = expr.span();
    let text = match expr {
        Expr::Lit(ExprLit { lit, .. }) => literal_text(&lit)?,
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match *expr {
            Expr::Lit(ExprLit {
                lit: lit @ (Lit::Int(_) | Lit::Float(_)),
                ..
            }) => format!("-{}", literal_text(&lit)?),
            other => return Err(syn::Error::new(other.span(), "expected a number")),
        },
        other => return Err(syn::Error::new(other.span(), "default must be a literal")),
    };

    Ok(LitStr::new(&text, span))
}

fn literal_text(lit: &Lit) -> syn::Result<String> {
    Ok(match lit {
        Lit::Str(lit) => lit.value(),
        Lit::Int(lit) => lit.base10_digits().to_owned(),
        Lit::Float(lit) => lit.base10_digits().to_owned(),
        Lit::Bool(lit) => lit.value.to_string(),
        other => return Err(syn::Error::new(other.span(), "unsupported default literal")),
    })
}
