use proc_macro::TokenStream;

mod entity;

/// Turn a newtype over `entitainer::Record` into a typed host type.
///
/// ```text
/// #[derive(Entity)]
/// #[entity(attributes(title, date), belongs_to(artist), has_many(tracks))]
/// pub struct Album(Record);
/// ```
///
/// Directives are applied in the order written. An optional
/// `name = "..."` overrides the entity name used in diagnostics.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input.into()).into()
}
