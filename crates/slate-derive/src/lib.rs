//! Derive macro for slate entities.
//!
//! This crate provides `#[derive(Entity)]`, which describes a struct's mapped
//! fields statically so no runtime type inspection is needed.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, LitStr, Type, parse_macro_input};

/// Derives `slate_core::Entity` (and an empty `slate_core::Hooks`) for a
/// struct with named fields.
///
/// # Struct Attributes
///
/// - `#[orm(table = "sys_user")]` - Table name (defaults to the struct name)
/// - `#[orm(hooks)]` - Do not generate `Hooks`; the struct implements it
///
/// # Field Attributes
///
/// - `#[orm("name:user_name;constraint:PRIMARY KEY")]` - Annotation in the
///   `key:value;key:value` grammar. `name` overrides the column name,
///   `constraint` is appended to the column definition, other keys are
///   ignored.
/// - `#[orm(skip)]` - Not mapped; restored with `Default` when decoding
///
/// Every other named field is mapped, in declaration order, and its type must
/// implement `slate_core::FieldType`.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let entity_attrs = parse_entity_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut mapped: Vec<FieldInfo> = Vec::new();
    let mut skipped: Vec<Ident> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            skipped.push(field_name);
        } else {
            mapped.push(FieldInfo {
                field_name,
                field_type: field.ty.clone(),
                annotation: attrs.annotation,
            });
        }
    }

    if mapped.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "Entity derive needs at least one mapped field",
        ));
    }

    let entity_name = struct_name.to_string();
    let table_tokens = match &entity_attrs.table {
        Some(table) => quote! { ::core::option::Option::Some(#table) },
        None => quote! { ::core::option::Option::None },
    };

    let descriptors: Vec<TokenStream2> = mapped
        .iter()
        .map(|info| {
            let name = info.field_name.to_string();
            let field_type = &info.field_type;
            let annotation = match &info.annotation {
                Some(text) => quote! { ::core::option::Option::Some(#text) },
                None => quote! { ::core::option::Option::None },
            };
            quote! {
                ::slate_core::FieldDescriptor::new(
                    #name,
                    #annotation,
                    <#field_type as ::slate_core::FieldType>::KIND,
                )
            }
        })
        .collect();

    let value_exprs: Vec<TokenStream2> = mapped
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            quote! { ::slate_core::FieldType::to_value(&self.#field_name) }
        })
        .collect();

    let non_zero_exprs: Vec<TokenStream2> = mapped
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            quote! { !::slate_core::FieldType::is_zero(&self.#field_name) }
        })
        .collect();

    let decode_exprs: Vec<TokenStream2> = mapped
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let name = field_name.to_string();
            quote! {
                #field_name: ::slate_core::entity::decode_field(&mut values, #name)?
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let hooks_impl = if entity_attrs.hooks {
        quote! {}
    } else {
        quote! {
            impl #impl_generics ::slate_core::Hooks for #struct_name #ty_generics #where_clause {}
        }
    };

    let expanded = quote! {
        impl #impl_generics ::slate_core::Entity for #struct_name #ty_generics #where_clause {
            const DESCRIPTOR: ::slate_core::EntityDescriptor = ::slate_core::EntityDescriptor {
                name: #entity_name,
                table: #table_tokens,
                fields: &[#(#descriptors),*],
            };

            fn values(&self) -> ::std::vec::Vec<::slate_core::SqlValue> {
                ::std::vec![#(#value_exprs),*]
            }

            fn non_zero_mask(&self) -> ::std::vec::Vec<bool> {
                ::std::vec![#(#non_zero_exprs),*]
            }

            fn from_values(
                values: ::std::vec::Vec<::slate_core::SqlValue>,
            ) -> ::core::result::Result<Self, ::slate_core::DecodeError> {
                let mut values = values.into_iter();
                ::core::result::Result::Ok(Self {
                    #(#decode_exprs,)*
                    #(#skipped: ::core::default::Default::default(),)*
                })
            }
        }

        #hooks_impl
    };

    Ok(expanded)
}

struct FieldInfo {
    field_name: Ident,
    field_type: Type,
    annotation: Option<LitStr>,
}

#[derive(Default)]
struct EntityAttrs {
    table: Option<String>,
    hooks: bool,
}

#[derive(Default)]
struct FieldAttrs {
    annotation: Option<LitStr>,
    skip: bool,
}

fn parse_entity_attrs(attrs: &[Attribute]) -> syn::Result<EntityAttrs> {
    let mut result = EntityAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: Expr = meta.value()?.parse()?;
                if let Expr::Lit(lit) = value
                    && let Lit::Str(s) = lit.lit
                {
                    result.table = Some(s.value());
                    return Ok(());
                }
                Err(meta.error("expected a string literal table name"))
            } else if meta.path.is_ident("hooks") {
                result.hooks = true;
                Ok(())
            } else {
                Err(meta.error("unsupported orm attribute; expected `table` or `hooks`"))
            }
        })?;
    }
    Ok(result)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        if let Ok(text) = attr.parse_args::<LitStr>() {
            check_annotation(&text)?;
            result.annotation = Some(text);
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                result.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected an annotation string or `skip`"))
            }
        })?;
    }
    Ok(result)
}

/// Rejects pairs that are not exactly `key:value`, as the runtime parser does.
fn check_annotation(text: &LitStr) -> syn::Result<()> {
    for pair in text.value().split(';') {
        if pair.trim().is_empty() {
            continue;
        }
        if pair.split(':').count() != 2 {
            return Err(syn::Error::new_spanned(
                text,
                format!("malformed annotation pair `{pair}`; expected `key:value`"),
            ));
        }
    }
    Ok(())
}
