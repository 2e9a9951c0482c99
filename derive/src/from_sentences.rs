use std::collections::BTreeSet;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result, Type,
    parse::{Parse, ParseStream},
};

pub(crate) fn expand_from_sentences(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`FromSentences` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`FromSentences` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut codes = BTreeSet::new();

    for FieldMetadata { code, .. } in &fields {
        if !codes.insert(code.value()) {
            Err(Error::new_spanned(code, "Sentence codes must be unique."))?
        }
    }

    let cases = fields.iter().map(|field| {
        let FieldMetadata { name, code, is_vec } = field;

        let assignment = if *is_vec {
            quote! {
                self.#name.push(Default::default());
                self.#name.last_mut().map(|r| r as _)
            }
        } else {
            quote! {
                Some(self.#name.insert(Default::default()))
            }
        };

        quote! { #code => { #assignment } }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl ::sextant::avec::FromSentences for #name {
            fn add_sentence(
                &mut self,
                code: ::sextant::sans::classify::TypeCode,
            ) -> Option<&mut dyn ::sextant::avec::FromSentence> {
                match code.as_str() {
                    #(#cases)*
                    _ => None,
                }
            }
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    code: LitStr,
    is_vec: bool,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("sentence")) else {
            return Ok(None);
        };

        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let SentenceAttribute { code } = attr.meta.require_list()?.parse_args()?;

        let Type::Path(path) = &field.ty else {
            Err(Error::new_spanned(
                &field.ty,
                "Field must have a type annotation.",
            ))?
        };

        let Some(segment) = path.path.segments.last() else {
            Err(Error::new_spanned(
                &path.path.segments,
                "Field must have an `Option<T>` or `Vec<T>` type.",
            ))?
        };

        let is_vec = if segment.ident == "Option" {
            false
        } else if segment.ident == "Vec" {
            true
        } else {
            Err(Error::new_spanned(
                &segment.ident,
                "Field must have an `Option<T>` or `Vec<T>` type.",
            ))?
        };

        Ok(Some(Self { name, code, is_vec }))
    }
}

#[derive(Debug)]
struct SentenceAttribute {
    code: LitStr,
}

impl Parse for SentenceAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        // Codes are accepted quoted or bare, as in `sentence(RMC)`.
        let code = if input.peek(LitStr) {
            input.parse::<LitStr>()?
        } else {
            let ident = input.parse::<Ident>()?;
            LitStr::new(&ident.to_string(), ident.span())
        };

        let value = code.value();

        if value.len() != 3 || !value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Err(Error::new_spanned(
                &code,
                "Sentence code must be three ASCII letters or digits.",
            ))?
        }

        Ok(Self { code })
    }
}
