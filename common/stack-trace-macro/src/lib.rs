//! `#[stack_trace_debug]`: a `Debug` impl that prints the error's `Display`
//! message followed by the chain of causes reachable through
//! `std::error::Error::source`.
//!
//! Paired with `snafu`'s `#[snafu(implicit)] location: Location` fields,
//! this gives every error in the workspace a `Debug` output that reads like
//! a stack trace without needing `RUST_BACKTRACE` or a panic hook.

use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;
use syn::parse_macro_input;

#[proc_macro_attribute]
pub fn stack_trace_debug(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        #input

        impl #impl_generics ::std::fmt::Debug for #ident #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{self}")?;
                let mut cause = ::std::error::Error::source(self);
                while let Some(err) = cause {
                    write!(f, "\ncaused by: {err}")?;
                    cause = ::std::error::Error::source(err);
                }
                Ok(())
            }
        }
    };

    TokenStream::from(expanded)
}
