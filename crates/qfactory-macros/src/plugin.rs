use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::{Ident, ItemFn, LitStr, ReturnType};

// ─── Parsing ──────────────────────────────────────────────────────────────────

/// Parses the optional `"name"` argument.
fn parse_name(attr: TokenStream, func: &ItemFn) -> syn::Result<LitStr> {
    let name = if attr.is_empty() {
        LitStr::new(&func.sig.ident.unraw().to_string(), func.sig.ident.span())
    } else {
        syn::parse2::<LitStr>(attr)?
    };

    if name.value().is_empty() {
        return Err(syn::Error::new(name.span(), "runner plugin name must not be empty"));
    }
    Ok(name)
}

/// Rejects signatures the generated constructor cannot call.
fn check_signature(func: &ItemFn) -> syn::Result<()> {
    let sig = &func.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "runner plugin constructors must not be async",
        ));
    }
    if !sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "runner plugin constructors take no arguments",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "runner plugin constructors must not be generic",
        ));
    }
    if let ReturnType::Default = sig.output {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "runner plugin constructors must return a type implementing `Runner`",
        ));
    }
    Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// `couchdb` → `_RUNNER_PLUGIN_COUCHDB`, `r#type` → `_RUNNER_PLUGIN_TYPE`
fn static_ident(fn_name: &Ident) -> Ident {
    let upper = fn_name.unraw().to_string().to_uppercase();
    Ident::new(&format!("_RUNNER_PLUGIN_{upper}"), Span::call_site())
}

// ─── Code generation ──────────────────────────────────────────────────────────

/// Implementation of `#[runner_plugin]` / `#[runner_plugin("name")]`.
pub fn runner_plugin(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func: ItemFn = match syn::parse2(item) {
        Ok(func) => func,
        Err(err) => return err.to_compile_error(),
    };

    let name = match check_signature(&func).and_then(|()| parse_name(attr, &func)) {
        Ok(name) => name,
        Err(err) => return err.to_compile_error(),
    };

    let fn_name = &func.sig.ident;
    let static_name = static_ident(fn_name);

    quote! {
        #func

        #[::qfactory_core::linkme::distributed_slice(::qfactory_core::RUNNER_PLUGINS)]
        #[linkme(crate = ::qfactory_core::linkme)]
        static #static_name: ::qfactory_core::PluginEntry = ::qfactory_core::PluginEntry::new(
            #name,
            ::std::module_path!(),
            || ::std::boxed::Box::new(#fn_name()) as ::qfactory_core::BoxedRunner,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(attr: TokenStream, item: TokenStream) -> String {
        runner_plugin(attr, item).to_string()
    }

    #[test]
    fn test_explicit_name() {
        let out = expand(quote!("couchdb"), quote!(fn make() -> CouchDbRunner { CouchDbRunner }));
        assert!(out.contains("RUNNER_PLUGINS"));
        assert!(out.contains("_RUNNER_PLUGIN_MAKE"));
        assert!(out.contains("\"couchdb\""));
    }

    #[test]
    fn test_name_defaults_to_function() {
        let out = expand(TokenStream::new(), quote!(fn couchdb() -> CouchDbRunner { CouchDbRunner }));
        assert!(out.contains("\"couchdb\""));
    }

    #[test]
    fn test_raw_identifier_name() {
        let out = expand(TokenStream::new(), quote!(fn r#type() -> TypeRunner { TypeRunner }));
        assert!(out.contains("_RUNNER_PLUGIN_TYPE"));
        assert!(out.contains("\"type\""));
        assert!(!out.contains("\"r#type\""));
        assert!(!out.contains("compile_error"));
    }

    #[test]
    fn test_rejects_empty_name() {
        let out = expand(quote!(""), quote!(fn make() -> CouchDbRunner { CouchDbRunner }));
        assert!(out.contains("compile_error"));
        assert!(out.contains("must not be empty"));
    }

    #[test]
    fn test_rejects_arguments_and_async() {
        let out = expand(quote!("x"), quote!(fn make(url: String) -> R { R(url) }));
        assert!(out.contains("take no arguments"));

        let out = expand(quote!("x"), quote!(async fn make() -> R { R }));
        assert!(out.contains("must not be async"));

        let out = expand(quote!("x"), quote!(fn make() {}));
        assert!(out.contains("must return"));
    }
}
