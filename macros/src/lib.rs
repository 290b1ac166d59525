use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, spanned::Spanned, Ident, ItemFn, LitStr};

/// Test attribute used across rxcombine.
///
/// - `#[rxcombine_macro::test]` on a sync fn expands to `#[test]`.
/// - On an async fn it expands to `#[tokio::test]` (current-thread runtime).
/// - `#[rxcombine_macro::test(threaded)]` selects the multi-thread runtime.
///
/// Every expansion installs a `tracing-subscriber` test writer first, so
/// `RUST_LOG=rxcombine=trace cargo test` shows the protocol trace of the test.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxcombine_macro::test flavor args are only supported for async tests. Use \
           #[rxcombine_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      (ident.to_string(), ident.span())
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      (lit.value(), lit.span())
    } else {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxcombine_macro::test only accepts: #[rxcombine_macro::test], \
           #[rxcombine_macro::test(current)] or #[rxcombine_macro::test(threaded)]",
        )
        .to_compile_error(),
      );
    };

    match flavor.0.as_str() {
      "current" => quote!(flavor = "current_thread"),
      "threaded" => quote!(flavor = "multi_thread", worker_threads = 2),
      _ => {
        return TokenStream::from(
          syn::Error::new(
            flavor.1,
            "rxcombine_macro::test only accepts `current` or `threaded` as the runtime flavor",
          )
          .to_compile_error(),
        );
      }
    }
  };

  input.block.stmts.insert(
    0,
    parse_quote! {
      let _ = ::tracing_subscriber::fmt()
        .with_env_filter(::tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    },
  );

  let attr = if is_async { quote!(#[tokio::test(#tokio_args)]) } else { quote!(#[test]) };

  let expanded = quote! {
      #attr
      #input
  };

  TokenStream::from(expanded)
}
