use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_sentence;
mod from_sentences;

#[proc_macro_derive(FromSentence, attributes(field))]
pub fn derive_from_sentence(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match from_sentence::expand_from_sentence(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(FromSentences, attributes(sentence))]
pub fn derive_from_sentences(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match from_sentences::expand_from_sentences(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}
