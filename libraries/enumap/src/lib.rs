//! `#[derive(EnuMap)]` on a fieldless enum generates `<Enum>Map<T>`: a struct with one `T` per variant.
//!
//! The generated struct derives `serde::Serialize`/`serde::Deserialize`, so the deriving crate must
//! depend on `serde` with the `derive` feature. Fields are the snake_cased variant names, which keeps
//! the JSON readable (`{"heart": ..., "trophy": ...}`). A `#[serde(rename_all = "...")]` on the enum
//! is carried over to the map, so its keys match how the variants themselves serialize.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Token, parenthesized, parse_macro_input, token};

#[proc_macro_derive(EnuMap)]
pub fn derive_enumap(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// `GoldStar` becomes `gold_star`.
fn field_name(variant: &Ident) -> Ident {
    let name = variant.to_string();
    let mut snake = String::with_capacity(name.len() + 4);
    for (i, ch) in name.char_indices() {
        if ch.is_uppercase() && i > 0 {
            snake.push('_');
        }
        snake.push(ch.to_ascii_lowercase());
    }
    Ident::new(&snake, variant.span())
}

/// The enum's `#[serde(rename_all = "...")]`, if any. Applied to the map's fields it spells
/// each key the same way serde spells the variant.
fn serde_rename_all(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    let mut rename_all = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.input.peek(Token![=]) {
                let value = meta.value()?;
                if meta.path.is_ident("rename_all") {
                    rename_all = Some(value.parse::<LitStr>()?);
                } else {
                    value.parse::<syn::Expr>()?;
                }
            } else if meta.input.peek(token::Paren) {
                let content;
                parenthesized!(content in meta.input);
                content.parse::<TokenStream2>()?;
            }
            Ok(())
        })?;
    }
    Ok(rename_all)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "EnuMap can only be derived for enums",
        ));
    };

    let variants = data
        .variants
        .iter()
        .map(|variant| match variant.fields {
            Fields::Unit => Ok(&variant.ident),
            _ => Err(syn::Error::new_spanned(
                variant,
                "EnuMap variants can't carry data",
            )),
        })
        .collect::<syn::Result<Vec<_>>>()?;
    let fields: Vec<Ident> = variants.iter().map(|variant| field_name(variant)).collect();

    let key = &input.ident;
    let vis = &input.vis;
    let map = format_ident!("{key}Map");
    let rename_all = serde_rename_all(input)?.map(|style| quote!(#[serde(rename_all = #style)]));

    Ok(quote! {
        #[derive(Clone, Debug, Default, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        #rename_all
        #vis struct #map<T> {
            #(pub #fields: T,)*
        }

        impl<T> #map<T> {
            /// Build a map by computing the value for each variant.
            pub fn from_fn(mut f: impl FnMut(#key) -> T) -> Self {
                Self {
                    #(#fields: f(#key::#variants),)*
                }
            }

            pub fn get(&self, key: &#key) -> &T {
                match key {
                    #(#key::#variants => &self.#fields,)*
                }
            }

            pub fn get_mut(&mut self, key: &#key) -> &mut T {
                match key {
                    #(#key::#variants => &mut self.#fields,)*
                }
            }

            /// Entries in declaration order.
            pub fn iter(&self) -> impl Iterator<Item = (#key, &T)> {
                [#((#key::#variants, &self.#fields)),*].into_iter()
            }
        }
    })
}
