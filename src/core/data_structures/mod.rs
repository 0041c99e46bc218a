/*!
 * Data Structures
 *
 * Small-string storage for keys and diagnostic labels.
 */

mod inline_string;

pub use inline_string::InlineString;
