//! Symbolic constant table
//!
//! Integer-valued pipeline properties may be written with the API's symbolic names
//! (`VK_CULL_MODE_BACK_BIT`) instead of raw numbers. The table below is kept sorted by
//! name so lookups are a binary search.

/// A named integer constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    /// Full symbolic name, including the `VK_` prefix
    pub name: &'static str,
    /// The integer the name stands for
    pub value: i32,
}

/// All known symbolic constants, sorted by name
pub static ENUM_VALUES: [EnumValue; 82] = [
    EnumValue { name: "VK_BLEND_FACTOR_CONSTANT_ALPHA", value: 12 },
    EnumValue { name: "VK_BLEND_FACTOR_CONSTANT_COLOR", value: 10 },
    EnumValue { name: "VK_BLEND_FACTOR_DST_ALPHA", value: 8 },
    EnumValue { name: "VK_BLEND_FACTOR_DST_COLOR", value: 4 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE", value: 1 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_CONSTANT_ALPHA", value: 13 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_CONSTANT_COLOR", value: 11 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_DST_ALPHA", value: 9 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_DST_COLOR", value: 5 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_SRC1_ALPHA", value: 18 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_SRC1_COLOR", value: 16 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_SRC_ALPHA", value: 7 },
    EnumValue { name: "VK_BLEND_FACTOR_ONE_MINUS_SRC_COLOR", value: 3 },
    EnumValue { name: "VK_BLEND_FACTOR_SRC1_ALPHA", value: 17 },
    EnumValue { name: "VK_BLEND_FACTOR_SRC1_COLOR", value: 15 },
    EnumValue { name: "VK_BLEND_FACTOR_SRC_ALPHA", value: 6 },
    EnumValue { name: "VK_BLEND_FACTOR_SRC_ALPHA_SATURATE", value: 14 },
    EnumValue { name: "VK_BLEND_FACTOR_SRC_COLOR", value: 2 },
    EnumValue { name: "VK_BLEND_FACTOR_ZERO", value: 0 },
    EnumValue { name: "VK_BLEND_OP_ADD", value: 0 },
    EnumValue { name: "VK_BLEND_OP_MAX", value: 4 },
    EnumValue { name: "VK_BLEND_OP_MIN", value: 3 },
    EnumValue { name: "VK_BLEND_OP_REVERSE_SUBTRACT", value: 2 },
    EnumValue { name: "VK_BLEND_OP_SUBTRACT", value: 1 },
    EnumValue { name: "VK_COLOR_COMPONENT_A_BIT", value: 8 },
    EnumValue { name: "VK_COLOR_COMPONENT_B_BIT", value: 4 },
    EnumValue { name: "VK_COLOR_COMPONENT_G_BIT", value: 2 },
    EnumValue { name: "VK_COLOR_COMPONENT_R_BIT", value: 1 },
    EnumValue { name: "VK_COMPARE_OP_ALWAYS", value: 7 },
    EnumValue { name: "VK_COMPARE_OP_EQUAL", value: 2 },
    EnumValue { name: "VK_COMPARE_OP_GREATER", value: 4 },
    EnumValue { name: "VK_COMPARE_OP_GREATER_OR_EQUAL", value: 6 },
    EnumValue { name: "VK_COMPARE_OP_LESS", value: 1 },
    EnumValue { name: "VK_COMPARE_OP_LESS_OR_EQUAL", value: 3 },
    EnumValue { name: "VK_COMPARE_OP_NEVER", value: 0 },
    EnumValue { name: "VK_COMPARE_OP_NOT_EQUAL", value: 5 },
    EnumValue { name: "VK_CULL_MODE_BACK_BIT", value: 2 },
    EnumValue { name: "VK_CULL_MODE_FRONT_AND_BACK", value: 3 },
    EnumValue { name: "VK_CULL_MODE_FRONT_BIT", value: 1 },
    EnumValue { name: "VK_CULL_MODE_NONE", value: 0 },
    EnumValue { name: "VK_FALSE", value: 0 },
    EnumValue { name: "VK_FRONT_FACE_CLOCKWISE", value: 1 },
    EnumValue { name: "VK_FRONT_FACE_COUNTER_CLOCKWISE", value: 0 },
    EnumValue { name: "VK_LOGIC_OP_AND", value: 1 },
    EnumValue { name: "VK_LOGIC_OP_AND_INVERTED", value: 4 },
    EnumValue { name: "VK_LOGIC_OP_AND_REVERSE", value: 2 },
    EnumValue { name: "VK_LOGIC_OP_CLEAR", value: 0 },
    EnumValue { name: "VK_LOGIC_OP_COPY", value: 3 },
    EnumValue { name: "VK_LOGIC_OP_COPY_INVERTED", value: 12 },
    EnumValue { name: "VK_LOGIC_OP_EQUIVALENT", value: 9 },
    EnumValue { name: "VK_LOGIC_OP_INVERT", value: 10 },
    EnumValue { name: "VK_LOGIC_OP_NAND", value: 14 },
    EnumValue { name: "VK_LOGIC_OP_NOR", value: 8 },
    EnumValue { name: "VK_LOGIC_OP_NO_OP", value: 5 },
    EnumValue { name: "VK_LOGIC_OP_OR", value: 7 },
    EnumValue { name: "VK_LOGIC_OP_OR_INVERTED", value: 13 },
    EnumValue { name: "VK_LOGIC_OP_OR_REVERSE", value: 11 },
    EnumValue { name: "VK_LOGIC_OP_SET", value: 15 },
    EnumValue { name: "VK_LOGIC_OP_XOR", value: 6 },
    EnumValue { name: "VK_POLYGON_MODE_FILL", value: 0 },
    EnumValue { name: "VK_POLYGON_MODE_LINE", value: 1 },
    EnumValue { name: "VK_POLYGON_MODE_POINT", value: 2 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_LINE_LIST", value: 1 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_LINE_LIST_WITH_ADJACENCY", value: 6 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_LINE_STRIP", value: 2 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_LINE_STRIP_WITH_ADJACENCY", value: 7 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_PATCH_LIST", value: 10 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_POINT_LIST", value: 0 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_TRIANGLE_FAN", value: 5 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_TRIANGLE_LIST", value: 3 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_TRIANGLE_LIST_WITH_ADJACENCY", value: 8 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_TRIANGLE_STRIP", value: 4 },
    EnumValue { name: "VK_PRIMITIVE_TOPOLOGY_TRIANGLE_STRIP_WITH_ADJACENCY", value: 9 },
    EnumValue { name: "VK_STENCIL_OP_DECREMENT_AND_CLAMP", value: 4 },
    EnumValue { name: "VK_STENCIL_OP_DECREMENT_AND_WRAP", value: 7 },
    EnumValue { name: "VK_STENCIL_OP_INCREMENT_AND_CLAMP", value: 3 },
    EnumValue { name: "VK_STENCIL_OP_INCREMENT_AND_WRAP", value: 6 },
    EnumValue { name: "VK_STENCIL_OP_INVERT", value: 5 },
    EnumValue { name: "VK_STENCIL_OP_KEEP", value: 0 },
    EnumValue { name: "VK_STENCIL_OP_REPLACE", value: 2 },
    EnumValue { name: "VK_STENCIL_OP_ZERO", value: 1 },
    EnumValue { name: "VK_TRUE", value: 1 },
];

/// Looks up a constant by its exact name
///
/// # Arguments
/// * `name` - Full symbolic name such as `VK_COMPARE_OP_LESS`
///
/// # Returns
/// The constant's value, or None when the name is unknown
pub fn lookup(name: &str) -> Option<i32> {
    ENUM_VALUES.binary_search_by(|entry| entry.name.cmp(name)).ok().map(|index| ENUM_VALUES[index].value)
}

/// Looks up a constant that may be written without its family prefix
///
/// The name is tried as given, then with `prefix` prepended, then with `prefix`
/// prepended and `_BIT` appended, so `BACK` resolves to `VK_CULL_MODE_BACK_BIT`
/// when the prefix is `VK_CULL_MODE_`.
pub fn lookup_scoped(prefix: Option<&str>, name: &str) -> Option<i32> {
    if let Some(value) = lookup(name) {
        return Some(value);
    }

    let prefix = prefix?;
    lookup(&format!("{prefix}{name}")).or_else(|| lookup(&format!("{prefix}{name}_BIT")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in ENUM_VALUES.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} must sort before {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn test_lookup_every_entry() {
        for entry in ENUM_VALUES.iter() {
            assert_eq!(lookup(entry.name), Some(entry.value));
        }
        assert_eq!(lookup("VK_NOT_A_REAL_NAME"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn test_scoped_lookup() {
        assert_eq!(lookup_scoped(Some("VK_CULL_MODE_"), "BACK"), Some(2));
        assert_eq!(lookup_scoped(Some("VK_CULL_MODE_"), "FRONT_AND_BACK"), Some(3));
        assert_eq!(lookup_scoped(Some("VK_CULL_MODE_"), "VK_CULL_MODE_FRONT_BIT"), Some(1));
        assert_eq!(lookup_scoped(Some("VK_COMPARE_OP_"), "LESS_OR_EQUAL"), Some(3));
        assert_eq!(lookup_scoped(Some("VK_CULL_MODE_"), "bogus"), None);
        assert_eq!(lookup_scoped(None, "BACK"), None);
    }
}
