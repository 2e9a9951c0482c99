use std::collections::BTreeMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Expr, ExprClosure, Field, Fields, Ident, LitInt, Pat, PathArguments,
    Result, Token, Type,
    parse::{Parse, ParseStream},
    parse_quote,
    spanned::Spanned,
};

pub(crate) fn expand_from_sentence(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`FromSentence` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`FromSentence` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut field_cases: BTreeMap<u8, Expr> = BTreeMap::new();
    let mut type_case: Option<Expr> = None;

    for field in fields {
        let FieldMetadata {
            name,
            ty,
            identifier,
            handler,
        } = field;

        match identifier {
            FieldIdentifier::Number(number) => {
                let assignment = match handler {
                    Some(handler) => call(&name, &ty, handler, parse_quote!(&[u8]), "value"),
                    None => parse_quote! {
                        self.#name = ::core::str::from_utf8(value)
                            .ok()
                            .filter(|s| !s.is_empty())
                            .and_then(|s| s.parse().ok())
                    },
                };

                let index = number.base10_parse::<u8>()?;

                if field_cases.insert(index, assignment).is_some() {
                    Err(Error::new(
                        number.span(),
                        "Field identifiers must be unique.",
                    ))?
                }
            }
            FieldIdentifier::Type(token) => {
                let assignment = match handler {
                    Some(handler) => call(
                        &name,
                        &ty,
                        handler,
                        parse_quote!(::sextant::sans::classify::TypeCode),
                        "code",
                    ),
                    None => parse_quote! { self.#name = Some(code) },
                };

                if type_case.replace(assignment).is_some() {
                    Err(Error::new(token.span, "Field identifiers must be unique."))?
                }
            }
        }
    }

    let field_method = (!field_cases.is_empty()).then(|| {
        let cases = field_cases
            .iter()
            .map(|(index, assignment)| quote! { #index => { #assignment; } });

        quote! {
            fn add_field(&mut self, field: u8, value: &[u8]) {
                match field {
                    #(#cases)*
                    _ => {}
                };
            }
        }
    });

    let type_method = type_case.map(|assignment| {
        quote! {
            fn set_type(&mut self, code: ::sextant::sans::classify::TypeCode) {
                #assignment;
            }
        }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl ::sextant::avec::FromSentence for #name {
            #field_method
            #type_method
        }
    };

    Ok(expanded.into())
}

/// Invoke a handler closure on a struct field.
///
/// Untyped parameters are annotated with the field type and `value_type`.
fn call(name: &Ident, ty: &Type, handler: ExprClosure, value_type: Type, value: &str) -> Expr {
    let body = handler.body;
    let value = Ident::new(value, name.span());
    let mut inputs = handler.inputs.into_iter();

    // Both parameters are checked during parsing.
    let acc = match inputs.next() {
        Some(Pat::Type(pat_type)) => quote!(#pat_type),
        Some(pat) => quote!(#pat: &mut #ty),
        None => quote!(_: &mut #ty),
    };
    let val = match inputs.next() {
        Some(Pat::Type(pat_type)) => quote!(#pat_type),
        Some(pat) => quote!(#pat: #value_type),
        None => quote!(_: #value_type),
    };

    parse_quote! {
        (|#acc, #val| { #body })(&mut self.#name, #value)
    }
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    ty: Type,
    identifier: FieldIdentifier,
    handler: Option<ExprClosure>,
}

#[derive(Debug)]
enum FieldIdentifier {
    Number(LitInt),
    Type(Token![type]),
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            return Ok(None);
        };

        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let FieldAttribute {
            identifier,
            handler,
        } = attr.meta.require_list()?.parse_args()?;

        if let Some(handler) = &handler {
            if handler.inputs.len() != 2 {
                Err(Error::new_spanned(
                    &handler.inputs,
                    "Handler closure must have two parameters.",
                ))?
            }
        } else {
            require_option(&field.ty)?;
        }

        Ok(Some(Self {
            name,
            ty: field.ty.clone(),
            identifier,
            handler,
        }))
    }
}

/// Check that a field without a handler has type `Option<T>`.
fn require_option(ty: &Type) -> Result<()> {
    let Type::Path(path) = ty else {
        Err(Error::new_spanned(ty, "Field must have a type annotation."))?
    };

    let Some(segment) = path.path.segments.last() else {
        Err(Error::new_spanned(
            &path.path.segments,
            "Field must have a type annotation.",
        ))?
    };

    if segment.ident != "Option" {
        Err(Error::new_spanned(
            &segment.ident,
            "Field without a handler must have type `Option<T>`.",
        ))?
    }

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        Err(Error::new_spanned(
            &segment.arguments,
            "Field of type `Option<T>` must have a generic parameter.",
        ))?
    };

    if arguments.args.len() != 1 {
        Err(Error::new_spanned(
            &arguments.args,
            "Field of type `Option<T>` must have a generic parameter.",
        ))?
    }

    Ok(())
}

#[derive(Debug)]
struct FieldAttribute {
    identifier: FieldIdentifier,
    handler: Option<ExprClosure>,
}

impl Parse for FieldAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let identifier = if input.peek(Token![type]) {
            FieldIdentifier::Type(input.parse()?)
        } else if input.peek(LitInt) {
            FieldIdentifier::Number(input.parse()?)
        } else {
            Err(input.error("Field identifier must be an integer literal or `type`."))?
        };

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self {
            identifier,
            handler,
        })
    }
}
