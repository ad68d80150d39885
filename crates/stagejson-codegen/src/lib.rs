// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitInt, LitStr};

/// Per-field options from `#[value(...)]`.
#[derive(Default)]
struct FieldOptions {
    rename: Option<String>,
    order: Option<i32>,
    read_only: bool,
    write_only: bool,
    skip: bool,
}

impl FieldOptions {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("value") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    options.rename = Some(lit.value());
                } else if meta.path.is_ident("order") {
                    let value = meta.value()?;
                    let negative = value.peek(syn::Token![-]);
                    if negative {
                        value.parse::<syn::Token![-]>()?;
                    }
                    let lit: LitInt = value.parse()?;
                    let order: i32 = lit.base10_parse()?;
                    options.order = Some(if negative { -order } else { order });
                } else if meta.path.is_ident("read_only") {
                    options.read_only = true;
                } else if meta.path.is_ident("write_only") {
                    options.write_only = true;
                } else if meta.path.is_ident("skip") {
                    options.skip = true;
                } else {
                    return Err(meta.error(
                        "expected one of: rename, order, read_only, write_only, skip",
                    ));
                }
                Ok(())
            })?;
        }
        if options.read_only && options.write_only {
            return Err(syn::Error::new_spanned(
                field,
                "a member cannot be both read_only and write_only",
            ));
        }
        Ok(options)
    }
}

/// `#[derive(Value)]` macro: generates the member list (`Object`) and the
/// `Value` impl routing through it.
///
/// Supports structs with named fields. Field attributes:
/// - `rename = "name"`: key used in encoded output
/// - `order = N`: emission order (defaults to declaration position)
/// - `read_only`: encoded but never assigned on decode
/// - `write_only`: assigned on decode but never encoded
/// - `skip`: not a member at all
///
/// Decoding starts from `Default::default()`, so the struct must implement
/// `Default`.
///
/// Example:
/// ```ignore
/// use stagejson::Value;
///
/// #[derive(Default, Value)]
/// struct Account {
///     #[value(rename = "user")]
///     name: String,
///     #[value(read_only)]
///     id: u64,
///     #[value(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Value, attributes(value))]
pub fn derive_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct MemberInfo {
    index: usize,
    ident: syn::Ident,
    ty: syn::Type,
    name: String,
    order: i32,
    can_read: bool,
    can_write: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Value cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => return Err(syn::Error::new_spanned(input, "Only named fields are supported")),
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    let mut members = Vec::new();
    for (position, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let options = FieldOptions::parse(field)?;
        if options.skip {
            continue;
        }
        let order = match options.order {
            Some(order) => order,
            None => i32::try_from(position)
                .map_err(|_| syn::Error::new_spanned(field, "too many fields"))?,
        };
        let member_name = options
            .rename
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
        if let Some(existing) = members.iter().find(|m: &&MemberInfo| m.name == member_name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate member name `{}` (also used by `{}`)", member_name, existing.ident),
            ));
        }
        members.push(MemberInfo {
            index: members.len(),
            ident,
            ty: field.ty.clone(),
            name: member_name,
            order,
            can_read: !options.write_only,
            can_write: !options.read_only,
        });
    }
    // Stable: equal orders keep declaration order.
    members.sort_by_key(|m| m.order);

    let accessors = members.iter().map(|m| {
        let get = format_ident!("__get_{}", m.index);
        let set = format_ident!("__set_{}", m.index);
        let type_key = format_ident!("__type_{}", m.index);
        let ident = &m.ident;
        let ty = &m.ty;
        quote! {
            fn #get<'a>(
                value: &'a #name,
                writer: &mut dyn ::stagejson::ValueWriter<'a>,
            ) -> ::stagejson::Result<()> {
                ::stagejson::dispatch::write_value(&value.#ident, writer)
            }

            fn #set(
                value: &mut #name,
                reader: &mut dyn ::stagejson::ValueReader,
            ) -> ::stagejson::Result<()> {
                value.#ident = ::stagejson::dispatch::read_value::<#ty>(reader)?;
                Ok(())
            }

            fn #type_key() -> ::stagejson::TypeKey {
                ::stagejson::TypeKey::of::<#ty>()
            }
        }
    });

    let entries = members.iter().map(|m| {
        let get = format_ident!("__get_{}", m.index);
        let set = format_ident!("__set_{}", m.index);
        let type_key = format_ident!("__type_{}", m.index);
        let member_name = &m.name;
        let order = m.order;
        let can_read = m.can_read;
        let can_write = m.can_write;
        quote! {
            ::stagejson::adapters::Member {
                name: #member_name,
                type_key: #type_key,
                can_read: #can_read,
                can_write: #can_write,
                order: #order,
                get: #get,
                set: #set,
            }
        }
    });
    let count = members.len();

    Ok(quote! {
        #[allow(non_snake_case, clippy::all)]
        const _: () = {
            #(#accessors)*

            static MEMBERS: [::stagejson::adapters::Member<#name>; #count] = [#(#entries),*];

            impl ::stagejson::adapters::Object for #name {
                fn members() -> &'static [::stagejson::adapters::Member<Self>] {
                    &MEMBERS
                }
            }

            impl ::stagejson::dispatch::Value for #name {
                fn write_value<'a>(
                    &'a self,
                    writer: &mut dyn ::stagejson::ValueWriter<'a>,
                ) -> ::stagejson::Result<()> {
                    ::stagejson::adapters::write_object(self, writer)
                }

                fn read_value(
                    reader: &mut dyn ::stagejson::ValueReader,
                ) -> ::stagejson::Result<Self> {
                    ::stagejson::adapters::read_object(reader)
                }
            }
        };
    })
}
