//! Attribute and field-type parsing for `#[derive(Bind)]`.
//!
//! Field names follow serde: `#[serde(rename = "...")]`,
//! `#[serde(rename(deserialize = "..."))]` and container-level
//! `#[serde(rename_all = "...")]` decide the name the deserializer expects.
//! `#[bind(key = "...")]` overrides the external key; a key of `-`,
//! `#[bind(skip)]`, `#[serde(skip)]` and `#[serde(skip_deserializing)]` all
//! mean the field never binds.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{
    ext::IdentExt, meta::ParseNestedMeta, spanned::Spanned, Attribute, Data, DeriveInput, Expr,
    Fields, GenericArgument, Ident, LitStr, PathArguments, Token, Type,
};

/// A parsed record.
#[derive(Debug)]
pub struct BindInput {
    /// Every named field, in declaration order.
    pub fields: Vec<BindField>,
}

/// A parsed record field.
#[derive(Debug)]
pub struct BindField {
    /// Name the deserializer expects.
    pub name: String,
    /// External key, `None` when the field never binds.
    pub key: Option<String>,
    /// Declared type classification.
    pub kind: Kind,
}

/// Field type classification, mirrored by `archimedes_bind::FieldKind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Int,
    Uint,
    Float,
    Bool,
    String,
    /// Element kind.
    Array(Box<Kind>),
    /// Value kind.
    Object(Box<Kind>),
    /// Label, and the type itself when it can be named from outside the
    /// record.
    Named(String, Option<Type>),
}

#[derive(Debug, Clone, Copy)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "lowercase" => Ok(Self::Lower),
            "UPPERCASE" => Ok(Self::Upper),
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            "snake_case" => Ok(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            "kebab-case" => Ok(Self::Kebab),
            "SCREAMING-KEBAB-CASE" => Ok(Self::ScreamingKebab),
            other => Err(syn::Error::new(
                lit.span(),
                format!("unknown rename rule: {other}"),
            )),
        }
    }

    fn apply(self, field: &str) -> String {
        match self {
            Self::Lower => field.to_lowercase(),
            Self::Upper => field.to_uppercase(),
            Self::Pascal => field.to_upper_camel_case(),
            Self::Camel => field.to_lower_camel_case(),
            Self::Snake => field.to_snake_case(),
            Self::ScreamingSnake => field.to_shouty_snake_case(),
            Self::Kebab => field.to_kebab_case(),
            Self::ScreamingKebab => field.to_shouty_kebab_case(),
        }
    }
}

impl BindInput {
    /// Parses a derive input, accepting only structs with named fields.
    pub fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named,
                _ => return Err(not_a_record(input)),
            },
            _ => return Err(not_a_record(input)),
        };

        let rename_all = parse_container_attrs(&input.attrs)?;

        let fields = named
            .named
            .iter()
            .map(|field| {
                let ident = field
                    .ident
                    .as_ref()
                    .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
                BindField::parse(ident, &field.attrs, &field.ty, rename_all)
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self { fields })
    }
}

fn not_a_record(input: &DeriveInput) -> syn::Error {
    syn::Error::new(
        input.ident.span(),
        "Bind can only be derived for structs with named fields",
    )
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<Option<RenameRule>> {
    let mut rename_all = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                if let Some(lit) = parse_deserialize_name(&meta)? {
                    rename_all = Some(RenameRule::parse(&lit)?);
                }
                Ok(())
            } else {
                skip_meta(&meta)
            }
        })?;
    }

    Ok(rename_all)
}

impl BindField {
    fn parse(
        ident: &Ident,
        attrs: &[Attribute],
        ty: &Type,
        rename_all: Option<RenameRule>,
    ) -> syn::Result<Self> {
        let field_name = ident.unraw().to_string();
        let mut name = rename_all.map_or_else(|| field_name.clone(), |rule| rule.apply(&field_name));
        let mut key = None;
        let mut skipped = false;

        for attr in attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        if let Some(lit) = parse_deserialize_name(&meta)? {
                            name = lit.value();
                        }
                        Ok(())
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing")
                    {
                        skipped = true;
                        Ok(())
                    } else if meta.path.is_ident("flatten") {
                        Err(meta.error("Bind does not support flattened fields"))
                    } else {
                        skip_meta(&meta)
                    }
                })?;
            } else if attr.path().is_ident("bind") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("key") {
                        let lit: LitStr = meta.value()?.parse()?;
                        key = Some(lit.value());
                        Ok(())
                    } else if meta.path.is_ident("skip") {
                        skipped = true;
                        Ok(())
                    } else {
                        Err(meta.error("unknown bind attribute, expected `key` or `skip`"))
                    }
                })?;
            }
        }

        let key = if skipped || key.as_deref() == Some("-") {
            None
        } else {
            Some(key.unwrap_or_else(|| name.clone()))
        };

        Ok(Self {
            name,
            key,
            kind: classify(ty),
        })
    }
}

/// Reads `name = "..."` or `name(deserialize = "...")`.
fn parse_deserialize_name(meta: &ParseNestedMeta) -> syn::Result<Option<LitStr>> {
    if meta.input.peek(Token![=]) {
        return Ok(Some(meta.value()?.parse()?));
    }

    let mut found = None;
    meta.parse_nested_meta(|inner| {
        let lit: LitStr = inner.value()?.parse()?;
        if inner.path.is_ident("deserialize") {
            found = Some(lit);
        }
        Ok(())
    })?;
    Ok(found)
}

/// Consumes a serde attribute this macro has no interest in.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream = content.parse()?;
    }
    Ok(())
}

/// Classifies a field type by its syntax.
///
/// `Option`, `Box`, `Rc`, `Arc` and `Cow` are looked through. Sequences and
/// maps carry the kind of their elements and values; anything unrecognized
/// keeps its own name.
pub fn classify(ty: &Type) -> Kind {
    match ty {
        Type::Reference(r) => classify(&r.elem),
        Type::Paren(p) => classify(&p.elem),
        Type::Group(g) => classify(&g.elem),
        Type::Array(a) => Kind::Array(Box::new(classify(&a.elem))),
        Type::Slice(s) => Kind::Array(Box::new(classify(&s.elem))),
        Type::Tuple(t) if !t.elems.is_empty() => {
            let mut kinds = t.elems.iter().map(classify);
            let first = kinds.next().unwrap_or_else(|| opaque(ty));
            let element = if kinds.all(|kind| kind == first) {
                first
            } else {
                opaque(ty)
            };
            Kind::Array(Box::new(element))
        }
        Type::Path(p) if p.qself.is_none() => {
            let Some(segment) = p.path.segments.last() else {
                return opaque(ty);
            };
            let name = segment.ident.to_string();
            match name.as_str() {
                "Option" | "Box" | "Rc" | "Arc" | "Cow" => type_args(&segment.arguments)
                    .next()
                    .map_or_else(|| Kind::Named(name.clone(), None), classify),
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => Kind::Int,
                "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => Kind::Uint,
                "f32" | "f64" => Kind::Float,
                "bool" => Kind::Bool,
                "String" | "str" | "char" => Kind::String,
                "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet"
                | "SmallVec" => Kind::Array(Box::new(element_kind(
                    type_args(&segment.arguments).next(),
                ))),
                "HashMap" | "BTreeMap" | "IndexMap" | "Map" | "ValueMap" => Kind::Object(
                    Box::new(element_kind(type_args(&segment.arguments).nth(1))),
                ),
                _ => Kind::Named(name, Some(ty.clone())),
            }
        }
        _ => opaque(ty),
    }
}

fn opaque(ty: &Type) -> Kind {
    Kind::Named(ty.to_token_stream().to_string(), None)
}

/// Kind of a collection's element type; an untyped collection such as
/// `ValueMap` holds arbitrary JSON.
fn element_kind(ty: Option<&Type>) -> Kind {
    ty.map_or_else(|| Kind::Named("Value".into(), None), classify)
}

fn type_args(arguments: &PathArguments) -> impl Iterator<Item = &Type> {
    let args = match arguments {
        PathArguments::AngleBracketed(args) => Some(&args.args),
        _ => None,
    };
    args.into_iter().flatten().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}
