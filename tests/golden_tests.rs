//! Golden tests: end-to-end pipeline against two worked schemas
//!
//! Each test drives the full `Registry -> Arena -> NamePass -> collision
//! check -> codegen::sink` pipeline the way a generator binary does, and
//! asserts on the shape of the emitted C rather than running it (the C is
//! never compiled here — these are generator-side tests).

use tempfile::tempdir;

use jipg::codegen::sink::{implementation_guard, write_single_file, write_split};
use jipg::ir::Builder;
use jipg::{generate, GeneratorConfig, Registry};

fn person_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register("Person", |arena| {
            let mut b = Builder::new(arena);
            let name = b.string()?;
            let age = b.int("int64_t")?;
            let friend = b.string()?;
            let friends = b.array(friend)?;
            let parent = b.string()?;
            let parents = b.array_cap(parent, 2)?;
            let fields = vec![
                b.field("name", name),
                b.field("age", age),
                b.field("friends", friends),
                b.field("parents", parents),
            ];
            b.object(fields)
        })
        .unwrap();
    registry
}

fn shapes_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register("Shapes", |arena| {
            let mut b = Builder::new(arena);
            let x = b.float("double")?;
            let y = b.float("double")?;
            let coord = b.object(vec![b.field("x", x), b.field("y", y)])?;
            let sides = b.int("int64_t")?;
            let radius = b.float("double")?;
            let shape = b.object(vec![
                b.field("sides", sides),
                b.field("radius", radius),
                b.field("coord", coord),
            ])?;
            b.array(shape)
        })
        .unwrap();
    registry
}

// =============================================================================
// End-to-end generation: Person
// =============================================================================

#[test]
fn person_header_declares_struct_and_entry_points() {
    let registry = person_registry();
    let config = GeneratorConfig::default();
    let output = generate(&registry, &config, "person_parser.h").unwrap();

    assert!(output.header.contains("#ifndef PERSON_PARSER_H"));
    assert!(output.header.contains("typedef struct {"));
    assert!(output.header.contains("} Person;"));
    assert!(output.header.contains("char *name;"));
    assert!(output.header.contains("int64_t age;"));
    assert!(output
        .header
        .contains("bool parse_Person(const char *json, size_t json_len, Person *out);"));
    assert!(output
        .header
        .contains("bool parse_Person_cstr(const char *json, Person *out);"));
}

#[test]
fn person_bounded_array_rejects_third_parent() {
    let registry = person_registry();
    let config = GeneratorConfig::default();
    let output = generate(&registry, &config, "person_parser.h").unwrap();

    // parents:Array(String,2) must reject a three-element input. The
    // emitted parser enforces this with an explicit count check rather
    // than silent truncation.
    assert!(output.source.contains("out->count >= 2"));
    assert!(output.source.contains("items[2];") || output.header.contains("items[2];"));
}

#[test]
fn person_object_parser_skips_unknown_keys_structurally() {
    let registry = person_registry();
    let config = GeneratorConfig::default();
    let output = generate(&registry, &config, "person_parser.h").unwrap();

    // An unrecognized key's value must still be consumed structurally,
    // or the lexer desynchronizes on the next token.
    assert!(output.source.contains("jipg_skip_value(lx, value)"));
}

// =============================================================================
// End-to-end generation: Shapes
// =============================================================================

#[test]
fn shapes_header_orders_coord_before_shape_before_shapes() {
    let registry = shapes_registry();
    let config = GeneratorConfig::default();
    let output = generate(&registry, &config, "shapes_parser.h").unwrap();

    assert!(output.header.contains("double x;"));
    assert!(output.header.contains("double radius;"));
    assert!(output
        .header
        .contains("bool parse_Shapes(const char *json, size_t json_len, Shapes *out);"));

    // Topological order: a nested aggregate (the coord object) must be
    // declared before the container that embeds it (the per-shape object),
    // which must in turn be declared before the Shapes array itself.
    let shapes_pos = output.header.find("} Shapes;").unwrap();
    let coord_marker = output
        .header
        .lines()
        .find(|l| l.contains("double y;"))
        .unwrap();
    let coord_pos = output.header.find(coord_marker).unwrap();
    assert!(coord_pos < shapes_pos);
}

#[test]
fn shapes_unbounded_array_grows_geometrically() {
    let registry = shapes_registry();
    let config = GeneratorConfig::default();
    let output = generate(&registry, &config, "shapes_parser.h").unwrap();

    assert!(output.source.contains("out->cap = 4;"));
    assert!(output.source.contains("out->cap *= 2;"));
}

// =============================================================================
// Registration / validation failures
// =============================================================================

#[test]
fn duplicate_top_level_name_is_rejected_at_registration() {
    let mut registry = Registry::new();
    registry
        .register("Dup", |arena| Builder::new(arena).string())
        .unwrap();
    let err = registry
        .register("Dup", |arena| Builder::new(arena).bool_())
        .unwrap_err();
    assert!(matches!(
        err,
        jipg::GeneratorError::DuplicateTopLevelName(_)
    ));
}

#[test]
fn generation_succeeds_for_distinct_keys() {
    // Generation must reject two distinct keys in the same object sharing
    // an S-box hash. No two short literal keys here are known to collide
    // under this table, so this exercises the success path; the collision
    // path itself is covered directly in `codegen::sbox`'s unit tests.
    let mut registry = Registry::new();
    registry
        .register("Widget", |arena| {
            let mut b = Builder::new(arena);
            let a = b.string()?;
            let c = b.string()?;
            b.object(vec![b.field("a", a), b.field("c", c)])
        })
        .unwrap();
    let config = GeneratorConfig::default();
    assert!(generate(&registry, &config, "widget.h").is_ok());
}

// =============================================================================
// Output sinks: split vs single-file
// =============================================================================

#[test]
fn split_output_writes_two_files_that_cross_include() {
    let registry = person_registry();
    let config = GeneratorConfig::default();
    let output = generate(&registry, &config, "person_parser.h").unwrap();

    let dir = tempdir().unwrap();
    let header_path = dir.path().join("person_parser.h");
    let source_path = dir.path().join("person_parser.c");
    write_split(&output, &header_path, &source_path).unwrap();

    let header_contents = std::fs::read_to_string(&header_path).unwrap();
    let source_contents = std::fs::read_to_string(&source_path).unwrap();
    assert!(header_contents.contains("Person"));
    assert!(source_contents.contains("#include \"person_parser.h\""));
    assert!(source_contents.contains("parse_Person"));
}

#[test]
fn single_file_output_guards_implementation_and_has_no_duplicate_symbol() {
    let registry = shapes_registry();
    let config = GeneratorConfig::default();
    let output = generate(&registry, &config, "shapes_parser.h").unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("shapes_parser.h");
    write_single_file(&output, &path, "shapes_parser.h").unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let guard = implementation_guard("shapes_parser.h");
    assert_eq!(guard, "SHAPES_PARSER_IMPLEMENTATION");
    assert!(contents.contains(&format!("#ifdef {guard}")));
    assert_eq!(contents.matches("bool parse_Shapes(").count(), 1);
}

// =============================================================================
// Object key order independence
// =============================================================================

#[test]
fn object_field_dispatch_is_order_independent_by_construction() {
    // The emitted dispatch switches on a hash of the key, not its position
    // in the source object, so permuting field declaration order in the
    // schema changes nothing about which case a given key hits.
    let mut registry_a = Registry::new();
    registry_a
        .register("Pair", |arena| {
            let mut b = Builder::new(arena);
            let x = b.string()?;
            let y = b.string()?;
            b.object(vec![b.field("x", x), b.field("y", y)])
        })
        .unwrap();

    let mut registry_b = Registry::new();
    registry_b
        .register("Pair", |arena| {
            let mut b = Builder::new(arena);
            let y = b.string()?;
            let x = b.string()?;
            b.object(vec![b.field("y", y), b.field("x", x)])
        })
        .unwrap();

    let config = GeneratorConfig::default();
    let out_a = generate(&registry_a, &config, "pair.h").unwrap();
    let out_b = generate(&registry_b, &config, "pair.h").unwrap();

    for needle in [
        "parse_str(lx, value, &out->x)",
        "parse_str(lx, value, &out->y)",
    ] {
        assert_eq!(
            out_a.source.contains(needle),
            out_b.source.contains(needle)
        );
    }
}
