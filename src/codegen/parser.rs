//! Runtime lexer + per-shape recursive-descent parser emission
//!
//! Everything in this module prints C, not Rust: a hand-written lexer and
//! primitive-value parsers (emitted once per output, shared by every
//! schema), followed by one recursive-descent parser function per
//! aggregate node, generated from the IR in the same post-order the header
//! emitter uses (a nested aggregate's parser must exist before the parser
//! that calls it).
//!
//! The lexer and primitive parsers below fix several bugs present in the
//! original hand-written C generator this crate replaces — see the
//! comments inline and `DESIGN.md` for the full accounting.

use std::collections::HashSet;

use crate::codegen::header::{children_of, collect_post_order, type_name};
use crate::codegen::sbox;
use crate::ir::{Arena, NodeId, NodeKind};

/// The lexer, primitive-value parsers, and allocator hook — identical
/// across every generated output, so it is emitted once regardless of how
/// many schemas are registered.
pub fn emit_runtime_prelude() -> String {
    let mut out = String::new();
    out.push_str("#include <string.h>\n#include <stdlib.h>\n\n");
    out.push_str(&sbox::emit_table_c());
    out.push_str(
        r#"
#ifndef JIPG_REALLOC
#define JIPG_REALLOC realloc
#endif

typedef enum {
    JIPG_TOK_LBRACE, JIPG_TOK_RBRACE, JIPG_TOK_LBRACKET, JIPG_TOK_RBRACKET,
    JIPG_TOK_COLON, JIPG_TOK_COMMA, JIPG_TOK_STRING, JIPG_TOK_NUMBER,
    JIPG_TOK_TRUE, JIPG_TOK_FALSE, JIPG_TOK_NULL, JIPG_TOK_ILLEGAL, JIPG_TOK_EOF
} Jipg_TokenKind;

typedef struct {
    Jipg_TokenKind kind;
    size_t start;
    size_t len;
} Jipg_Token;

typedef struct {
    const char *buf;
    size_t len;
    size_t pos;
} Jipg_Lexer;

static void jipg_lexer_init(Jipg_Lexer *lx, const char *buf, size_t len) {
    lx->buf = buf;
    lx->len = len;
    lx->pos = 0;
}

static void jipg_skip_ws(Jipg_Lexer *lx) {
    while (lx->pos < lx->len) {
        char c = lx->buf[lx->pos];
        if (c == ' ' || c == '\t' || c == '\n' || c == '\r') {
            lx->pos++;
        } else {
            break;
        }
    }
}

/* Literal recognition compares at the lexer's *current* position. The
 * original generator scanned from the start of the buffer regardless of
 * where the cursor was, which misrecognized literals anywhere past the
 * first token; this reads lx->buf + lx->pos, not lx->buf. */
static int jipg_match_literal(Jipg_Lexer *lx, const char *word, size_t word_len) {
    if (lx->pos + word_len > lx->len) return 0;
    return memcmp(lx->buf + lx->pos, word, word_len) == 0;
}

static Jipg_Token jipg_next_token(Jipg_Lexer *lx) {
    jipg_skip_ws(lx);
    Jipg_Token tok;
    tok.start = lx->pos;
    if (lx->pos >= lx->len) {
        tok.kind = JIPG_TOK_EOF;
        tok.len = 0;
        return tok;
    }
    char c = lx->buf[lx->pos];
    switch (c) {
        case '{': lx->pos++; tok.kind = JIPG_TOK_LBRACE; tok.len = 1; return tok;
        case '}': lx->pos++; tok.kind = JIPG_TOK_RBRACE; tok.len = 1; return tok;
        case '[': lx->pos++; tok.kind = JIPG_TOK_LBRACKET; tok.len = 1; return tok;
        case ']': lx->pos++; tok.kind = JIPG_TOK_RBRACKET; tok.len = 1; return tok;
        case ':': lx->pos++; tok.kind = JIPG_TOK_COLON; tok.len = 1; return tok;
        case ',': lx->pos++; tok.kind = JIPG_TOK_COMMA; tok.len = 1; return tok;
        case '"': {
            size_t start = ++lx->pos;
            /* Raw span: this dialect does not unescape string contents,
             * it only finds the closing quote. Callers receive the bytes
             * between the quotes verbatim, backslash sequences included. */
            while (lx->pos < lx->len && lx->buf[lx->pos] != '"') {
                lx->pos++;
            }
            tok.kind = JIPG_TOK_STRING;
            tok.start = start;
            tok.len = lx->pos - start;
            if (lx->pos < lx->len) lx->pos++;
            return tok;
        }
        default: break;
    }
    if (jipg_match_literal(lx, "true", 4)) {
        lx->pos += 4; tok.kind = JIPG_TOK_TRUE; tok.len = 4; return tok;
    }
    if (jipg_match_literal(lx, "false", 5)) {
        lx->pos += 5; tok.kind = JIPG_TOK_FALSE; tok.len = 5; return tok;
    }
    if (jipg_match_literal(lx, "null", 4)) {
        lx->pos += 4; tok.kind = JIPG_TOK_NULL; tok.len = 4; return tok;
    }
    if (c == '-' || (c >= '0' && c <= '9')) {
        size_t start = lx->pos;
        if (lx->buf[lx->pos] == '-') lx->pos++;
        while (lx->pos < lx->len && lx->buf[lx->pos] >= '0' && lx->buf[lx->pos] <= '9') lx->pos++;
        if (lx->pos < lx->len && lx->buf[lx->pos] == '.') {
            lx->pos++;
            while (lx->pos < lx->len && lx->buf[lx->pos] >= '0' && lx->buf[lx->pos] <= '9') lx->pos++;
        }
        if (lx->pos < lx->len && (lx->buf[lx->pos] == 'e' || lx->buf[lx->pos] == 'E')) {
            lx->pos++;
            /* Optional exponent sign: the original scanner only accepted
             * `e<digits>`, rejecting the perfectly legal `1e-3` / `1e+3`. */
            if (lx->pos < lx->len && (lx->buf[lx->pos] == '+' || lx->buf[lx->pos] == '-')) {
                lx->pos++;
            }
            while (lx->pos < lx->len && lx->buf[lx->pos] >= '0' && lx->buf[lx->pos] <= '9') lx->pos++;
        }
        tok.kind = JIPG_TOK_NUMBER;
        tok.start = start;
        tok.len = lx->pos - start;
        return tok;
    }
    lx->pos++;
    tok.kind = JIPG_TOK_ILLEGAL;
    tok.len = 1;
    return tok;
}

static bool jipg_parse_bool(Jipg_Lexer *lx, Jipg_Token tok, bool *out) {
    (void)lx;
    if (tok.kind == JIPG_TOK_TRUE) { *out = true; return true; }
    if (tok.kind == JIPG_TOK_FALSE) { *out = false; return true; }
    return false;
}

/* Parses the decimal integer directly from the token span. The original
 * generator routed every integer through a float conversion first, which
 * silently loses precision past 2^53; this never goes through a double. */
static bool jipg_parse_int(Jipg_Lexer *lx, Jipg_Token tok, int64_t *out) {
    if (tok.kind != JIPG_TOK_NUMBER || tok.len == 0) return false;
    char buf[64];
    size_t n = tok.len < sizeof(buf) - 1 ? tok.len : sizeof(buf) - 1;
    memcpy(buf, lx->buf + tok.start, n);
    buf[n] = 0;
    char *end = NULL;
    long long v = strtoll(buf, &end, 10);
    if (end == buf) return false;
    *out = (int64_t)v;
    return true;
}

static bool jipg_parse_float(Jipg_Lexer *lx, Jipg_Token tok, double *out) {
    if (tok.kind != JIPG_TOK_NUMBER || tok.len == 0) return false;
    char buf[64];
    size_t n = tok.len < sizeof(buf) - 1 ? tok.len : sizeof(buf) - 1;
    memcpy(buf, lx->buf + tok.start, n);
    buf[n] = 0;
    char *end = NULL;
    double v = strtod(buf, &end);
    if (end == buf) return false;
    *out = v;
    return true;
}

static bool jipg_parse_str(Jipg_Lexer *lx, Jipg_Token tok, char **out) {
    if (tok.kind != JIPG_TOK_STRING) return false;
    char *s = (char *)JIPG_REALLOC(NULL, tok.len + 1);
    if (!s) return false;
    memcpy(s, lx->buf + tok.start, tok.len);
    s[tok.len] = 0;
    *out = s;
    return true;
}

/* Recursively discards one JSON value (object, array, string, number, or
 * literal) without building anything from it. Used when an object key's
 * hash doesn't match any of the fields the schema declares: skipping the
 * value keeps the lexer's cursor correctly positioned at the following
 * comma or closing brace instead of desynchronizing mid-structure. The
 * original generator had no such fallback for unrecognized keys. */
static bool jipg_skip_value(Jipg_Lexer *lx, Jipg_Token first) {
    switch (first.kind) {
        case JIPG_TOK_STRING:
        case JIPG_TOK_NUMBER:
        case JIPG_TOK_TRUE:
        case JIPG_TOK_FALSE:
        case JIPG_TOK_NULL:
            return true;
        case JIPG_TOK_LBRACE: {
            Jipg_Token tok = jipg_next_token(lx);
            if (tok.kind == JIPG_TOK_RBRACE) return true;
            for (;;) {
                if (tok.kind != JIPG_TOK_STRING) return false;
                Jipg_Token colon = jipg_next_token(lx);
                if (colon.kind != JIPG_TOK_COLON) return false;
                Jipg_Token value = jipg_next_token(lx);
                if (!jipg_skip_value(lx, value)) return false;
                Jipg_Token sep = jipg_next_token(lx);
                if (sep.kind == JIPG_TOK_RBRACE) return true;
                if (sep.kind != JIPG_TOK_COMMA) return false;
                tok = jipg_next_token(lx);
            }
        }
        case JIPG_TOK_LBRACKET: {
            Jipg_Token tok = jipg_next_token(lx);
            if (tok.kind == JIPG_TOK_RBRACKET) return true;
            for (;;) {
                if (!jipg_skip_value(lx, tok)) return false;
                Jipg_Token sep = jipg_next_token(lx);
                if (sep.kind == JIPG_TOK_RBRACKET) return true;
                if (sep.kind != JIPG_TOK_COMMA) return false;
                tok = jipg_next_token(lx);
            }
        }
        default:
            return false;
    }
}
"#,
    );
    out
}

fn field_hash_case(key: &str) -> u64 {
    sbox::sbox_hash(key.as_bytes())
}

fn emit_object_parser(arena: &Arena, id: NodeId, name: &str) -> String {
    let NodeKind::Object { fields } = &arena.get(id).kind else {
        unreachable!()
    };

    let mut s = format!("static bool parse_{name}(Jipg_Lexer *lx, {name} *out) {{\n");
    s.push_str("    Jipg_Token tok = jipg_next_token(lx);\n");
    s.push_str("    if (tok.kind != JIPG_TOK_LBRACE) return false;\n");
    s.push_str("    tok = jipg_next_token(lx);\n");
    s.push_str("    if (tok.kind == JIPG_TOK_RBRACE) return true;\n");
    s.push_str("    for (;;) {\n");
    s.push_str("        if (tok.kind != JIPG_TOK_STRING) return false;\n");
    s.push_str("        uint64_t key_hash = jipg_hash_span(lx, tok);\n");
    s.push_str("        Jipg_Token colon = jipg_next_token(lx);\n");
    s.push_str("        if (colon.kind != JIPG_TOK_COLON) return false;\n");
    s.push_str("        Jipg_Token value = jipg_next_token(lx);\n");
    s.push_str("        switch (key_hash) {\n");
    for field in fields {
        let hash = field_hash_case(&field.key);
        s.push_str(&format!("            case 0x{hash:016x}ULL: /* \"{}\" */\n", field.key));
        s.push_str(&emit_field_assignment(arena, field.value, &field.key));
        s.push_str("                break;\n");
    }
    s.push_str("            default:\n");
    s.push_str("                if (!jipg_skip_value(lx, value)) return false;\n");
    s.push_str("                break;\n");
    s.push_str("        }\n");
    s.push_str("        Jipg_Token sep = jipg_next_token(lx);\n");
    s.push_str("        if (sep.kind == JIPG_TOK_RBRACE) return true;\n");
    s.push_str("        if (sep.kind != JIPG_TOK_COMMA) return false;\n");
    s.push_str("        tok = jipg_next_token(lx);\n");
    s.push_str("    }\n");
    s.push_str("}\n\n");
    s
}

fn emit_field_assignment(arena: &Arena, value: NodeId, key: &str) -> String {
    match &arena.get(value).kind {
        NodeKind::Object { .. } | NodeKind::Array { .. } => {
            let child_name = type_name(arena, value);
            format!(
                "                if (!parse_{child_name}(lx, &out->{key})) return false;\n"
            )
        }
        NodeKind::String => format!(
            "                if (!jipg_parse_str(lx, value, &out->{key})) return false;\n"
        ),
        NodeKind::Int { .. } => format!(
            "                if (!jipg_parse_int(lx, value, &out->{key})) return false;\n"
        ),
        NodeKind::Float { .. } => format!(
            "                if (!jipg_parse_float(lx, value, &out->{key})) return false;\n"
        ),
        NodeKind::Bool => format!(
            "                if (!jipg_parse_bool(lx, value, &out->{key})) return false;\n"
        ),
    }
}

fn emit_element_parse_stmt(arena: &Arena, element: NodeId, dest: &str) -> String {
    match &arena.get(element).kind {
        NodeKind::Object { .. } | NodeKind::Array { .. } => {
            let child_name = type_name(arena, element);
            format!("if (!parse_{child_name}(lx, &{dest})) return false;")
        }
        NodeKind::String => format!("{{ Jipg_Token v = jipg_next_token(lx); if (!jipg_parse_str(lx, v, &{dest})) return false; }}"),
        NodeKind::Int { .. } => format!("{{ Jipg_Token v = jipg_next_token(lx); if (!jipg_parse_int(lx, v, &{dest})) return false; }}"),
        NodeKind::Float { .. } => format!("{{ Jipg_Token v = jipg_next_token(lx); if (!jipg_parse_float(lx, v, &{dest})) return false; }}"),
        NodeKind::Bool => format!("{{ Jipg_Token v = jipg_next_token(lx); if (!jipg_parse_bool(lx, v, &{dest})) return false; }}"),
    }
}

/// Every iteration peeks one token under a snapshot of the lexer state.
/// `]` terminates; a comma is consumed and the loop peeks again (this is
/// what makes a trailing comma before `]` tolerated — a second peek lands
/// straight on `]`); anything else means the peek landed on the first
/// token of an element, so the snapshot is restored before the element
/// parser (or scalar read) re-reads it from the beginning. Without that
/// restore, the element parser would start one token late — e.g. on the
/// comma following a string, or on an object's first field key instead of
/// its `{`.
fn emit_array_parser(arena: &Arena, id: NodeId, name: &str) -> String {
    let NodeKind::Array { element, cap } = &arena.get(id).kind else {
        unreachable!()
    };
    let elem_ty = type_name(arena, *element);
    let alloc_ty = if elem_ty.ends_with('*') {
        elem_ty.clone()
    } else {
        format!("{elem_ty} ")
    };

    let mut s = format!("static bool parse_{name}(Jipg_Lexer *lx, {name} *out) {{\n");
    s.push_str("    Jipg_Token tok = jipg_next_token(lx);\n");
    s.push_str("    if (tok.kind != JIPG_TOK_LBRACKET) return false;\n");
    s.push_str("    out->count = 0;\n");
    s.push_str("    bool jipg_need_comma = false;\n");

    if cap.is_none() {
        s.push_str("    out->cap = 4;\n");
        s.push_str(&format!(
            "    out->items = ({alloc_ty}*)JIPG_REALLOC(NULL, out->cap * sizeof(out->items[0]));\n"
        ));
        s.push_str("    if (!out->items) return false;\n");
    }

    s.push_str("    for (;;) {\n");
    s.push_str("        Jipg_Lexer jipg_saved = *lx;\n");
    s.push_str("        tok = jipg_next_token(lx);\n");
    s.push_str("        if (tok.kind == JIPG_TOK_RBRACKET) return true;\n");
    s.push_str("        if (jipg_need_comma) {\n");
    s.push_str("            if (tok.kind != JIPG_TOK_COMMA) return false;\n");
    s.push_str("            jipg_need_comma = false;\n");
    s.push_str("            continue;\n");
    s.push_str("        }\n");
    s.push_str("        *lx = jipg_saved;\n");
    match cap {
        Some(n) => {
            s.push_str(&format!(
                "        if (out->count >= {n}) return false; /* bounded array: reject the ({n}+1)-th element */\n"
            ));
        }
        None => {
            s.push_str("        if (out->count >= out->cap) {\n");
            s.push_str("            out->cap *= 2;\n");
            s.push_str(&format!(
                "            out->items = ({alloc_ty}*)JIPG_REALLOC(out->items, out->cap * sizeof(out->items[0]));\n"
            ));
            s.push_str("            if (!out->items) return false;\n");
            s.push_str("        }\n");
        }
    }
    s.push_str(&format!(
        "        {}\n",
        emit_element_parse_stmt(arena, *element, "out->items[out->count]")
    ));
    s.push_str("        out->count++;\n");
    s.push_str("        jipg_need_comma = true;\n");
    s.push_str("    }\n");
    s.push_str("}\n\n");
    s
}

fn emit_aggregate_parser(arena: &Arena, id: NodeId) -> String {
    let name = arena
        .get(id)
        .name
        .clone()
        .expect("aggregate node has no name; name pass must run before codegen");
    match &arena.get(id).kind {
        NodeKind::Object { .. } => emit_object_parser(arena, id, &name),
        NodeKind::Array { .. } => emit_array_parser(arena, id, &name),
        _ => unreachable!("emit_aggregate_parser called on non-aggregate"),
    }
}

/// Emit `jipg_hash_span`, every per-aggregate parser function (post-order),
/// and the public `parse_<name>` / `parse_<name>_cstr` entry points for
/// each registered root.
pub fn emit_parsers(arena: &Arena, roots: &[(String, NodeId)]) -> String {
    let mut out = String::new();
    out.push_str(
        "static uint64_t jipg_hash_span(Jipg_Lexer *lx, Jipg_Token tok) {\n\
         \x20   uint64_t h = 0;\n\
         \x20   for (size_t i = 0; i < tok.len; i++) {\n\
         \x20       h = (h + jipg_sbox[(unsigned char)lx->buf[tok.start + i]]) * 3;\n\
         \x20   }\n\
         \x20   return h;\n\
         }\n\n",
    );

    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for (_, root) in roots {
        collect_post_order(arena, *root, &mut visited, &mut order);
    }
    for id in &order {
        out.push_str(&emit_aggregate_parser(arena, *id));
    }

    for (name, root) in roots {
        out.push_str(&emit_entry_points(arena, *root, name));
    }
    out
}

fn emit_entry_points(arena: &Arena, root: NodeId, name: &str) -> String {
    let out_ty = type_name(arena, root);
    let mut s = String::new();
    s.push_str(&format!(
        "bool parse_{name}(const char *json, size_t json_len, {out_ty} *out) {{\n"
    ));
    s.push_str("    Jipg_Lexer lx;\n    jipg_lexer_init(&lx, json, json_len);\n");
    if arena.get(root).is_aggregate() {
        s.push_str(&format!("    return parse_{out_ty}(&lx, out);\n"));
    } else {
        s.push_str(&format!(
            "    Jipg_Token tok = jipg_next_token(&lx);\n    {}\n    return true;\n",
            emit_scalar_assign(arena, root)
        ));
    }
    s.push_str("}\n\n");
    s.push_str(&format!(
        "bool parse_{name}_cstr(const char *json, {out_ty} *out) {{\n\
         \x20   return parse_{name}(json, strlen(json), out);\n\
         }}\n\n"
    ));
    s
}

fn emit_scalar_assign(arena: &Arena, root: NodeId) -> String {
    match &arena.get(root).kind {
        NodeKind::String => "if (!jipg_parse_str(&lx, tok, out)) return false;".to_string(),
        NodeKind::Int { .. } => "if (!jipg_parse_int(&lx, tok, out)) return false;".to_string(),
        NodeKind::Float { .. } => "if (!jipg_parse_float(&lx, tok, out)) return false;".to_string(),
        NodeKind::Bool => "if (!jipg_parse_bool(&lx, tok, out)) return false;".to_string(),
        NodeKind::Object { .. } | NodeKind::Array { .. } => {
            unreachable!("emit_scalar_assign called on an aggregate root")
        }
    }
}
