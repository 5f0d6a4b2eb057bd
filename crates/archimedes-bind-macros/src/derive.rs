//! `#[derive(Bind)]` expansion.

use std::collections::HashSet;

use proc_macro2::{Ident, TokenStream, TokenTree};
use quote::{format_ident, quote, ToTokens};
use syn::{parse_quote, DeriveInput, GenericParam, Generics, Type};

use crate::parse::{BindField, BindInput, Kind};

/// Expands `#[derive(Bind)]` into an `archimedes_bind::Bind` impl whose
/// descriptor list is a `const` slice.
///
/// Element kinds are hoisted into their own consts so the slice only holds
/// references to items. Fields whose type can be named outside the impl get
/// a shape function, which resolves to the type's own descriptors when it
/// implements `Bind`.
pub fn expand_bind(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = BindInput::parse(input)?;
    let ident = &input.ident;

    let mut emitter = Emitter::new(&input.generics);
    let descriptors: Vec<_> = parsed
        .fields
        .iter()
        .map(|field| emitter.descriptor(field))
        .collect();
    let helpers = &emitter.helpers;

    let mut generics = input.generics.clone();
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(Self: ::archimedes_bind::__private::DeserializeOwned));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::archimedes_bind::Bind for #ident #ty_generics #where_clause {
            fn shape() -> ::archimedes_bind::TargetShape {
                #(#helpers)*
                const FIELDS: &[::archimedes_bind::FieldDescriptor] = &[
                    #(#descriptors),*
                ];
                ::archimedes_bind::TargetShape::Record(FIELDS)
            }
        }
    })
}

struct Emitter {
    /// Identifiers of the record's generic parameters, lifetimes included.
    params: HashSet<String>,
    helpers: Vec<TokenStream>,
}

impl Emitter {
    fn new(generics: &Generics) -> Self {
        let params = generics
            .params
            .iter()
            .map(|param| match param {
                GenericParam::Type(p) => p.ident.to_string(),
                GenericParam::Lifetime(p) => p.lifetime.ident.to_string(),
                GenericParam::Const(p) => p.ident.to_string(),
            })
            .collect();
        Self {
            params,
            helpers: Vec::new(),
        }
    }

    fn descriptor(&mut self, field: &BindField) -> TokenStream {
        let name = &field.name;
        let kind = self.kind(&field.kind);
        match &field.key {
            Some(key) => quote! {
                ::archimedes_bind::FieldDescriptor::new(#name, #key, #kind)
            },
            None => quote! {
                ::archimedes_bind::FieldDescriptor::skipped(#name, #kind)
            },
        }
    }

    fn kind(&mut self, kind: &Kind) -> TokenStream {
        match kind {
            Kind::Int => quote!(::archimedes_bind::FieldKind::Int),
            Kind::Uint => quote!(::archimedes_bind::FieldKind::Uint),
            Kind::Float => quote!(::archimedes_bind::FieldKind::Float),
            Kind::Bool => quote!(::archimedes_bind::FieldKind::Bool),
            Kind::String => quote!(::archimedes_bind::FieldKind::String),
            Kind::Array(element) => {
                let element = self.hoist(element);
                quote!(::archimedes_bind::FieldKind::Array(&#element))
            }
            Kind::Object(value) => {
                let value = self.hoist(value);
                quote!(::archimedes_bind::FieldKind::Object(&#value))
            }
            Kind::Named(name, ty) => {
                let nested = match ty.as_ref().filter(|ty| self.is_nameable(ty)) {
                    Some(ty) => {
                        let shape = self.shape_fn(ty);
                        quote!(::archimedes_bind::Nested::new(#shape))
                    }
                    None => quote!(::archimedes_bind::Nested::NONE),
                };
                quote!(::archimedes_bind::FieldKind::Named(#name, #nested))
            }
        }
    }

    fn hoist(&mut self, kind: &Kind) -> Ident {
        let tokens = self.kind(kind);
        let ident = format_ident!("__KIND_{}", self.helpers.len());
        self.helpers.push(quote! {
            const #ident: ::archimedes_bind::FieldKind = #tokens;
        });
        ident
    }

    fn shape_fn(&mut self, ty: &Type) -> Ident {
        let ident = format_ident!("__shape_{}", self.helpers.len());
        self.helpers.push(quote! {
            fn #ident() -> ::archimedes_bind::TargetShape {
                #[allow(unused_imports)]
                use ::archimedes_bind::__private::{BindShape as _, OpaqueShape as _};
                (&&::archimedes_bind::__private::ShapeTag::<#ty>::new()).shape_of()
            }
        });
        ident
    }

    /// Items nested in the impl cannot see its generics or `Self`.
    fn is_nameable(&self, ty: &Type) -> bool {
        !mentions(ty.to_token_stream(), &|ident: &Ident| {
            ident == "Self" || self.params.contains(&ident.to_string())
        })
    }
}

fn mentions(tokens: TokenStream, hit: &dyn Fn(&Ident) -> bool) -> bool {
    tokens.into_iter().any(|tree| match tree {
        TokenTree::Ident(ident) => hit(&ident),
        TokenTree::Group(group) => mentions(group.stream(), hit),
        TokenTree::Punct(_) | TokenTree::Literal(_) => false,
    })
}
