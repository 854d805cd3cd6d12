use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields, Ident, LitStr};

///
/// Directive
///

#[derive(Clone, Copy, PartialEq, Eq)]
enum Directive {
    Attributes,
    BelongsTo,
    HasMany,
}

impl Directive {
    const fn label(self) -> &'static str {
        match self {
            Self::Attributes => "attribute",
            Self::BelongsTo => "belongs_to relation",
            Self::HasMany => "has_many relation",
        }
    }
}

///
/// Declaration
///

struct Declaration {
    name: String,
    directives: Vec<(Directive, Vec<Ident>)>,
}

impl Declaration {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut name = input.ident.unraw().to_string();
        let mut directives = Vec::new();

        for attr in input.attrs.iter().filter(|a| a.path().is_ident("entity")) {
            attr.parse_nested_meta(|meta| {
                let directive = if meta.path.is_ident("attributes") {
                    Directive::Attributes
                } else if meta.path.is_ident("belongs_to") {
                    Directive::BelongsTo
                } else if meta.path.is_ident("has_many") {
                    Directive::HasMany
                } else if meta.path.is_ident("name") {
                    name = meta.value()?.parse::<LitStr>()?.value();
                    return Ok(());
                } else {
                    return Err(meta.error(
                        "expected `attributes(..)`, `belongs_to(..)`, `has_many(..)` or `name = \"..\"`",
                    ));
                };

                let mut idents = Vec::new();
                meta.parse_nested_meta(|item| {
                    let ident = item
                        .path
                        .get_ident()
                        .ok_or_else(|| item.error("expected a plain identifier"))?;
                    idents.push(ident.clone());
                    Ok(())
                })?;
                directives.push((directive, idents));
                Ok(())
            })?;
        }

        Ok(Self { name, directives })
    }
}

// Methods a typed host type already answers to, through `Entity` or by
// deref to `Record`. An accessor with one of these names would shadow it.
const RESERVED: &[&str] = &[
    "new",
    "build",
    "schema",
    "record",
    "try_from_record",
    "from_matching_record",
    "available_attributes",
    "available_belongs_tos",
    "available_has_manys",
    "entity_name",
    "same_entity_as",
    "get",
    "belongs_to",
    "has_many",
    "is_defined",
    "defined_attributes",
    "defined_attributes_with_values",
    "to_json",
];

///
/// Slots
/// The names a declaration resolves to, mirroring `SchemaBuilder::build`.
///

struct Slots {
    attributes: Vec<Ident>,
    belongs_tos: Vec<Ident>,
    has_manys: Vec<Ident>,
}

impl Slots {
    fn resolve(decl: &Declaration, span_ident: &Ident) -> syn::Result<Self> {
        let mut slots = Self {
            attributes: Vec::new(),
            belongs_tos: Vec::new(),
            has_manys: Vec::new(),
        };

        for (directive, idents) in &decl.directives {
            for ident in idents {
                match directive {
                    Directive::Attributes => push_distinct(&mut slots.attributes, ident.clone()),
                    Directive::BelongsTo => {
                        let fk = format_ident!("{}_id", ident.unraw(), span = ident.span());
                        push_distinct(&mut slots.attributes, fk);
                        push_distinct(&mut slots.belongs_tos, ident.clone());
                    }
                    Directive::HasMany => push_distinct(&mut slots.has_manys, ident.clone()),
                }
            }
        }

        match slots.attributes.iter().position(|a| a.unraw() == "id") {
            Some(0) => {}
            Some(pos) => {
                let id = slots.attributes.remove(pos);
                slots.attributes.insert(0, id);
            }
            None => slots.attributes.insert(0, Ident::new("id", span_ident.span())),
        }

        let kinds = [
            (Directive::Attributes, &slots.attributes),
            (Directive::BelongsTo, &slots.belongs_tos),
            (Directive::HasMany, &slots.has_manys),
        ];
        let mut seen: Vec<(String, Directive)> = Vec::new();
        for (kind, list) in kinds {
            for ident in list {
                let key = ident.unraw().to_string();
                if RESERVED.contains(&key.as_str()) {
                    return Err(Error::new(
                        ident.span(),
                        format!("`{key}` is reserved: it would shadow the `{key}` method of the entity"),
                    ));
                }
                if let Some((_, prev)) = seen.iter().find(|(k, _)| *k == key) {
                    return Err(Error::new(
                        ident.span(),
                        format!("`{key}` declared as both {} and {}", prev.label(), kind.label()),
                    ));
                }
                seen.push((key, kind));
            }
        }

        Ok(slots)
    }
}

fn push_distinct(list: &mut Vec<Ident>, ident: Ident) {
    if !list.iter().any(|i| i.unraw() == ident.unraw()) {
        list.push(ident);
    }
}

fn names(idents: &[Ident]) -> Vec<String> {
    idents.iter().map(|i| i.unraw().to_string()).collect()
}

// derive_entity
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let vis = &input.vis;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic types",
        ));
    }

    let is_record_newtype = matches!(
        &input.data,
        Data::Struct(data) if matches!(&data.fields, Fields::Unnamed(f) if f.unnamed.len() == 1)
    );
    if !is_record_newtype {
        return Err(Error::new_spanned(
            ident,
            "Entity can only be derived for a newtype over `entitainer::Record`",
        ));
    }

    let decl = Declaration::parse(input)?;
    let slots = Slots::resolve(&decl, ident)?;
    let entity_name = &decl.name;

    let directive_calls = decl.directives.iter().filter(|(_, idents)| !idents.is_empty()).map(
        |(directive, idents)| {
            let list = names(idents);
            match directive {
                Directive::Attributes => quote!(.attributes([#(#list),*])),
                Directive::BelongsTo => quote!(.belongs_to([#(#list),*])),
                Directive::HasMany => quote!(.has_many([#(#list),*])),
            }
        },
    );

    let attribute_accessors = slots.attributes.iter().map(|attr| {
        let key = attr.unraw().to_string();
        quote! {
            #vis fn #attr(&self) -> &::entitainer::Value {
                self.0.__read(#key)
            }
        }
    });

    let relation_accessors = slots.belongs_tos.iter().map(|rel| {
        let key = rel.unraw().to_string();
        quote! {
            #vis fn #rel(&self) -> ::core::option::Option<&::entitainer::Record> {
                self.0.__relation(#key)
            }
        }
    });

    let collection_accessors = slots.has_manys.iter().map(|many| {
        let key = many.unraw().to_string();
        quote! {
            #vis fn #many(&self) -> &[::entitainer::Record] {
                self.0.__collection(#key)
            }
        }
    });

    Ok(quote! {
        impl ::entitainer::Entity for #ident {
            fn schema() -> &'static ::std::sync::Arc<::entitainer::Schema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<::entitainer::Schema>> =
                    ::std::sync::OnceLock::new();

                SCHEMA.get_or_init(|| {
                    let declared = ::entitainer::Schema::builder(#entity_name)
                        #(#directive_calls)*
                        .build();
                    match declared {
                        ::core::result::Result::Ok(schema) => ::std::sync::Arc::new(schema),
                        ::core::result::Result::Err(err) => {
                            panic!("invalid entity declaration for {}: {}", #entity_name, err)
                        }
                    }
                })
            }

            fn from_matching_record(
                record: ::entitainer::Record,
                _: ::entitainer::entity::SchemaMatch,
            ) -> Self {
                Self(record)
            }

            fn record(&self) -> &::entitainer::Record {
                &self.0
            }
        }

        #[allow(dead_code)]
        impl #ident {
            #(#attribute_accessors)*
            #(#relation_accessors)*
            #(#collection_accessors)*
        }

        impl ::core::ops::Deref for #ident {
            type Target = ::entitainer::Record;

            fn deref(&self) -> &::entitainer::Record {
                &self.0
            }
        }

        impl ::core::cmp::PartialEq for #ident {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }

        impl ::core::fmt::Debug for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Debug::fmt(&self.0, f)
            }
        }

        impl ::core::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::convert::From<#ident> for ::entitainer::Record {
            fn from(entity: #ident) -> Self {
                entity.0
            }
        }

        impl ::core::convert::From<&#ident> for ::entitainer::Record {
            fn from(entity: &#ident) -> Self {
                ::core::clone::Clone::clone(&entity.0)
            }
        }

        impl ::core::convert::From<#ident> for ::entitainer::Value {
            fn from(entity: #ident) -> Self {
                ::entitainer::Value::Entity(entity.0)
            }
        }

        impl ::core::convert::From<&#ident> for ::entitainer::Value {
            fn from(entity: &#ident) -> Self {
                ::entitainer::Value::Entity(::core::clone::Clone::clone(&entity.0))
            }
        }
    })
}
