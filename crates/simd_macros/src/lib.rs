// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

mod target;

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Token, spanned::Spanned};

/// One entry of `#[multiversion(...)]`.
///
/// `"v3"` clones the body and compiles it with the features of `v3`.
/// `@"v3"` expects a hand-written `<name>_v3` next to the function.
struct Version {
    span: Span,
    target_cpu: &'static target::TargetCpu,
    handwritten: bool,
}

impl Parse for Version {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let handwritten = input.peek(Token![@]);
        if handwritten {
            let _: Token![@] = input.parse()?;
        }
        let literal: syn::LitStr = input.parse()?;
        let name = literal.value();
        let Some(target_cpu) = target::find(&name) else {
            return Err(syn::Error::new(
                literal.span(),
                format!("unknown target cpu `{name}`"),
            ));
        };
        Ok(Self {
            span: literal.span(),
            target_cpu,
            handwritten,
        })
    }
}

struct Versions(Punctuated<Version, Token![,]>);

impl Parse for Versions {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self(Punctuated::parse_terminated(input)?))
    }
}

fn check_signature(sig: &syn::Signature) -> syn::Result<Vec<syn::Ident>> {
    if let Some(constness) = &sig.constness {
        return Err(syn::Error::new(
            constness.span(),
            "const functions are not supported",
        ));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "async functions are not supported",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new(
            variadic.span(),
            "variadic parameters are not supported",
        ));
    }
    for param in sig.generics.params.iter() {
        if !matches!(param, syn::GenericParam::Lifetime(_)) {
            return Err(syn::Error::new(
                param.span(),
                "only lifetime parameters are supported",
            ));
        }
    }
    let mut arguments = Vec::new();
    for input in sig.inputs.iter() {
        let syn::FnArg::Typed(typed) = input else {
            return Err(syn::Error::new(
                input.span(),
                "receivers are not supported",
            ));
        };
        let syn::Pat::Ident(pat) = typed.pat.as_ref() else {
            return Err(syn::Error::new(
                typed.pat.span(),
                "patterns are not supported",
            ));
        };
        arguments.push(pat.ident.clone());
    }
    Ok(arguments)
}

fn expand_multiversion(versions: Versions, item: syn::ItemFn) -> syn::Result<TokenStream> {
    let syn::ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item;
    let arguments = check_signature(&sig)?;
    let ident = &sig.ident;
    let params = &sig.generics.params;
    let where_clause = &sig.generics.where_clause;
    let inputs = &sig.inputs;
    let output = &sig.output;
    let mut clones = TokenStream::new();
    let mut branches = TokenStream::new();
    for version in versions.0 {
        let arch = version.target_cpu.arch;
        let cpu = version.target_cpu.name;
        let name = syn::Ident::new(&format!("{ident}_{cpu}"), version.span);
        if !version.handwritten {
            clones.extend(quote! {
                #[inline]
                #[cfg(target_arch = #arch)]
                #[crate::target_cpu(enable = #cpu)]
                fn #name<#params>(#inputs) #output #where_clause #block
            });
        }
        branches.extend(quote! {
            #[cfg(target_arch = #arch)]
            if crate::is_cpu_detected!(#cpu) {
                let selected: unsafe fn(#inputs) #output = #name;
                CACHE.store(selected as *mut (), core::sync::atomic::Ordering::Relaxed);
                return unsafe { selected(#(#arguments,)*) };
            }
        });
    }
    Ok(quote! {
        #clones
        fn fallback<#params>(#inputs) #output #where_clause #block
        #[inline(always)]
        #(#attrs)* #vis #sig {
            static CACHE: core::sync::atomic::AtomicPtr<()> =
                core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());
            let cached = CACHE.load(core::sync::atomic::Ordering::Relaxed);
            if !cached.is_null() {
                let selected = unsafe {
                    core::mem::transmute::<*mut (), unsafe fn(#inputs) #output>(cached)
                };
                return unsafe { selected(#(#arguments,)*) };
            }
            #branches
            let selected: unsafe fn(#inputs) #output = fallback;
            CACHE.store(selected as *mut (), core::sync::atomic::Ordering::Relaxed);
            unsafe { selected(#(#arguments,)*) }
        }
    })
}

/// Compiles a function once per listed feature level and dispatches at
/// runtime to the best level the CPU supports, caching the choice.
///
/// The plain body also becomes `fallback`, which tests use as reference.
#[proc_macro_attribute]
pub fn multiversion(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let versions = syn::parse_macro_input!(attr as Versions);
    let item = syn::parse_macro_input!(item as syn::ItemFn);
    expand_multiversion(versions, item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct TargetCpuAttr {
    names: syn::LitStr,
}

impl Parse for TargetCpuAttr {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key != "enable" {
            return Err(syn::Error::new(key.span(), "expected `enable = \"...\"`"));
        }
        let _: Token![=] = input.parse()?;
        Ok(Self {
            names: input.parse()?,
        })
    }
}

/// Expands to the `#[target_feature]` list of one or more feature levels.
#[proc_macro_attribute]
pub fn target_cpu(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let attr = syn::parse_macro_input!(attr as TargetCpuAttr);
    let mut result = TokenStream::new();
    for name in attr.names.value().split(',') {
        let Some(target_cpu) = target::find(name) else {
            return syn::Error::new(attr.names.span(), format!("unknown target cpu `{name}`"))
                .into_compile_error()
                .into();
        };
        let features = target_cpu.features;
        result.extend(quote! {
            #(#[target_feature(enable = #features)])*
        });
    }
    result.extend(TokenStream::from(item));
    result.into()
}

/// Defines `is_<arch>_cpu_detected!("level")`, which forwards to
/// `$crate::internal::is_<level>_detected()`.
#[proc_macro]
pub fn define_is_cpu_detected(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let arch = syn::parse_macro_input!(input as syn::LitStr).value();
    let mut arms = TokenStream::new();
    for target_cpu in target::TARGET_CPUS.iter().filter(|t| t.arch == arch) {
        let name = target_cpu.name;
        let detect = syn::Ident::new(&format!("is_{name}_detected"), Span::mixed_site());
        arms.extend(quote! {
            (#name) => { $crate::internal::#detect() };
        });
    }
    let ident = syn::Ident::new(&format!("is_{arch}_cpu_detected"), Span::mixed_site());
    quote! {
        #[macro_export]
        macro_rules! #ident {
            #arms
        }
    }
    .into()
}
