use crate::entity::lexical_form;
use crate::pool::EntityPool;

/// One block per entity: its IRI, then a `  <predicate> : <value>` line per value.
pub fn to_text(pool: &EntityPool) -> String {
    let mut text = String::new();
    for entity in pool {
        text.push_str(entity.uri().as_str());
        text.push('\n');
        for (predicate, values) in entity.direct_properties() {
            for value in values {
                text.push_str("  ");
                text.push_str(predicate);
                text.push_str(" : ");
                text.push_str(lexical_form(value));
                text.push('\n');
            }
        }
    }
    text
}
