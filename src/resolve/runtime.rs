// Built-in view of the Java runtime library's public surface, used when no
// JDK is installed.
//
// Entries are written in JVM descriptor form so they share the class file
// descriptor parser. Only `java/lang/Object` is listed exhaustively; every
// other entry is marked incomplete.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::warn;

use super::classfile::{parse_field_descriptor, parse_method_descriptor};
use super::{MemberDeclaration, TypeDeclaration, TypeSolver};

struct RuntimeEntry {
    path: &'static str,
    super_class: Option<&'static str>,
    interfaces: &'static [&'static str],
    fields: &'static [(&'static str, &'static str)],
    methods: &'static [(&'static str, &'static str)],
}

const OBJECT: Option<&str> = Some("java/lang/Object");

const OBJECT_METHODS: &[(&str, &str)] = &[
    ("equals", "(Ljava/lang/Object;)Z"),
    ("hashCode", "()I"),
    ("toString", "()Ljava/lang/String;"),
    ("getClass", "()Ljava/lang/Class;"),
    ("notify", "()V"),
    ("notifyAll", "()V"),
    ("wait", "()V"),
    ("clone", "()Ljava/lang/Object;"),
    ("finalize", "()V"),
];

const BOXED_NUMBER_METHODS: &[(&str, &str)] = &[
    ("intValue", "()I"),
    ("longValue", "()J"),
    ("doubleValue", "()D"),
    ("floatValue", "()F"),
    ("shortValue", "()S"),
    ("byteValue", "()B"),
];

const COLLECTION_METHODS: &[(&str, &str)] = &[
    ("size", "()I"),
    ("isEmpty", "()Z"),
    ("contains", "(Ljava/lang/Object;)Z"),
    ("add", "(Ljava/lang/Object;)Z"),
    ("remove", "(Ljava/lang/Object;)Z"),
    ("clear", "()V"),
    ("iterator", "()Ljava/util/Iterator;"),
    ("stream", "()Ljava/util/stream/Stream;"),
    ("toArray", "()[Ljava/lang/Object;"),
    ("addAll", "(Ljava/util/Collection;)Z"),
];

const LIST_METHODS: &[(&str, &str)] = &[
    ("get", "(I)Ljava/lang/Object;"),
    ("set", "(ILjava/lang/Object;)Ljava/lang/Object;"),
    ("indexOf", "(Ljava/lang/Object;)I"),
    ("subList", "(II)Ljava/util/List;"),
    ("of", "()Ljava/util/List;"),
];

const MAP_METHODS: &[(&str, &str)] = &[
    ("get", "(Ljava/lang/Object;)Ljava/lang/Object;"),
    ("put", "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;"),
    ("remove", "(Ljava/lang/Object;)Ljava/lang/Object;"),
    ("containsKey", "(Ljava/lang/Object;)Z"),
    ("containsValue", "(Ljava/lang/Object;)Z"),
    ("size", "()I"),
    ("isEmpty", "()Z"),
    ("keySet", "()Ljava/util/Set;"),
    ("values", "()Ljava/util/Collection;"),
    ("entrySet", "()Ljava/util/Set;"),
    ("getOrDefault", "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;"),
    ("clear", "()V"),
];

const RUNTIME_LIBRARY: &[RuntimeEntry] = &[
    RuntimeEntry {
        path: "java/lang/Object",
        super_class: None,
        interfaces: &[],
        fields: &[],
        methods: OBJECT_METHODS,
    },
    RuntimeEntry {
        path: "java/lang/String",
        super_class: OBJECT,
        interfaces: &["java/lang/CharSequence", "java/lang/Comparable", "java/io/Serializable"],
        fields: &[("CASE_INSENSITIVE_ORDER", "Ljava/util/Comparator;")],
        methods: &[
            ("length", "()I"),
            ("charAt", "(I)C"),
            ("isEmpty", "()Z"),
            ("substring", "(II)Ljava/lang/String;"),
            ("indexOf", "(Ljava/lang/String;)I"),
            ("lastIndexOf", "(Ljava/lang/String;)I"),
            ("startsWith", "(Ljava/lang/String;)Z"),
            ("endsWith", "(Ljava/lang/String;)Z"),
            ("contains", "(Ljava/lang/CharSequence;)Z"),
            ("replace", "(Ljava/lang/CharSequence;Ljava/lang/CharSequence;)Ljava/lang/String;"),
            ("split", "(Ljava/lang/String;)[Ljava/lang/String;"),
            ("trim", "()Ljava/lang/String;"),
            ("toLowerCase", "()Ljava/lang/String;"),
            ("toUpperCase", "()Ljava/lang/String;"),
            ("toCharArray", "()[C"),
            ("getBytes", "()[B"),
            ("format", "(Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/String;"),
            ("valueOf", "(Ljava/lang/Object;)Ljava/lang/String;"),
            ("equalsIgnoreCase", "(Ljava/lang/String;)Z"),
            ("intern", "()Ljava/lang/String;"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/CharSequence",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[("length", "()I"), ("charAt", "(I)C"), ("toString", "()Ljava/lang/String;")],
    },
    RuntimeEntry {
        path: "java/lang/Comparable",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[("compareTo", "(Ljava/lang/Object;)I")],
    },
    RuntimeEntry {
        path: "java/lang/Runnable",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[("run", "()V")],
    },
    RuntimeEntry {
        path: "java/lang/AutoCloseable",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[("close", "()V")],
    },
    RuntimeEntry {
        path: "java/lang/Iterable",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[("iterator", "()Ljava/util/Iterator;"), ("forEach", "(Ljava/util/function/Consumer;)V")],
    },
    RuntimeEntry {
        path: "java/lang/System",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[
            ("out", "Ljava/io/PrintStream;"),
            ("err", "Ljava/io/PrintStream;"),
            ("in", "Ljava/io/InputStream;"),
        ],
        methods: &[
            ("currentTimeMillis", "()J"),
            ("nanoTime", "()J"),
            ("arraycopy", "(Ljava/lang/Object;ILjava/lang/Object;II)V"),
            ("exit", "(I)V"),
            ("getProperty", "(Ljava/lang/String;)Ljava/lang/String;"),
            ("getenv", "(Ljava/lang/String;)Ljava/lang/String;"),
            ("identityHashCode", "(Ljava/lang/Object;)I"),
            ("lineSeparator", "()Ljava/lang/String;"),
            ("gc", "()V"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Math",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[("PI", "D"), ("E", "D")],
        methods: &[
            ("abs", "(I)I"),
            ("max", "(II)I"),
            ("min", "(II)I"),
            ("sqrt", "(D)D"),
            ("pow", "(DD)D"),
            ("floor", "(D)D"),
            ("ceil", "(D)D"),
            ("round", "(D)J"),
            ("random", "()D"),
            ("sin", "(D)D"),
            ("cos", "(D)D"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Number",
        super_class: OBJECT,
        interfaces: &["java/io/Serializable"],
        fields: &[],
        methods: BOXED_NUMBER_METHODS,
    },
    RuntimeEntry {
        path: "java/lang/Integer",
        super_class: Some("java/lang/Number"),
        interfaces: &["java/lang/Comparable"],
        fields: &[("MAX_VALUE", "I"), ("MIN_VALUE", "I"), ("SIZE", "I"), ("TYPE", "Ljava/lang/Class;")],
        methods: &[
            ("parseInt", "(Ljava/lang/String;)I"),
            ("valueOf", "(I)Ljava/lang/Integer;"),
            ("toString", "(I)Ljava/lang/String;"),
            ("toHexString", "(I)Ljava/lang/String;"),
            ("compare", "(II)I"),
            ("bitCount", "(I)I"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Long",
        super_class: Some("java/lang/Number"),
        interfaces: &["java/lang/Comparable"],
        fields: &[("MAX_VALUE", "J"), ("MIN_VALUE", "J"), ("SIZE", "I"), ("TYPE", "Ljava/lang/Class;")],
        methods: &[
            ("parseLong", "(Ljava/lang/String;)J"),
            ("valueOf", "(J)Ljava/lang/Long;"),
            ("toString", "(J)Ljava/lang/String;"),
            ("compare", "(JJ)I"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Short",
        super_class: Some("java/lang/Number"),
        interfaces: &["java/lang/Comparable"],
        fields: &[("MAX_VALUE", "S"), ("MIN_VALUE", "S")],
        methods: &[("valueOf", "(S)Ljava/lang/Short;")],
    },
    RuntimeEntry {
        path: "java/lang/Byte",
        super_class: Some("java/lang/Number"),
        interfaces: &["java/lang/Comparable"],
        fields: &[("MAX_VALUE", "B"), ("MIN_VALUE", "B")],
        methods: &[("valueOf", "(B)Ljava/lang/Byte;")],
    },
    RuntimeEntry {
        path: "java/lang/Double",
        super_class: Some("java/lang/Number"),
        interfaces: &["java/lang/Comparable"],
        fields: &[
            ("MAX_VALUE", "D"),
            ("MIN_VALUE", "D"),
            ("NaN", "D"),
            ("POSITIVE_INFINITY", "D"),
            ("NEGATIVE_INFINITY", "D"),
        ],
        methods: &[
            ("parseDouble", "(Ljava/lang/String;)D"),
            ("valueOf", "(D)Ljava/lang/Double;"),
            ("isNaN", "(D)Z"),
            ("compare", "(DD)I"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Float",
        super_class: Some("java/lang/Number"),
        interfaces: &["java/lang/Comparable"],
        fields: &[("MAX_VALUE", "F"), ("MIN_VALUE", "F"), ("NaN", "F")],
        methods: &[("parseFloat", "(Ljava/lang/String;)F"), ("valueOf", "(F)Ljava/lang/Float;")],
    },
    RuntimeEntry {
        path: "java/lang/Boolean",
        super_class: OBJECT,
        interfaces: &["java/io/Serializable", "java/lang/Comparable"],
        fields: &[("TRUE", "Ljava/lang/Boolean;"), ("FALSE", "Ljava/lang/Boolean;")],
        methods: &[
            ("booleanValue", "()Z"),
            ("parseBoolean", "(Ljava/lang/String;)Z"),
            ("valueOf", "(Z)Ljava/lang/Boolean;"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Character",
        super_class: OBJECT,
        interfaces: &["java/io/Serializable", "java/lang/Comparable"],
        fields: &[("MAX_VALUE", "C"), ("MIN_VALUE", "C")],
        methods: &[
            ("charValue", "()C"),
            ("isDigit", "(C)Z"),
            ("isLetter", "(C)Z"),
            ("isWhitespace", "(C)Z"),
            ("toUpperCase", "(C)C"),
            ("toLowerCase", "(C)C"),
            ("valueOf", "(C)Ljava/lang/Character;"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/StringBuilder",
        super_class: OBJECT,
        interfaces: &["java/lang/CharSequence", "java/io/Serializable"],
        fields: &[],
        methods: &[
            ("append", "(Ljava/lang/Object;)Ljava/lang/StringBuilder;"),
            ("insert", "(ILjava/lang/String;)Ljava/lang/StringBuilder;"),
            ("reverse", "()Ljava/lang/StringBuilder;"),
            ("setLength", "(I)V"),
            ("length", "()I"),
            ("toString", "()Ljava/lang/String;"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/StringBuffer",
        super_class: OBJECT,
        interfaces: &["java/lang/CharSequence", "java/io/Serializable"],
        fields: &[],
        methods: &[
            ("append", "(Ljava/lang/Object;)Ljava/lang/StringBuffer;"),
            ("length", "()I"),
            ("toString", "()Ljava/lang/String;"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Class",
        super_class: OBJECT,
        interfaces: &["java/io/Serializable"],
        fields: &[],
        methods: &[
            ("getName", "()Ljava/lang/String;"),
            ("getSimpleName", "()Ljava/lang/String;"),
            ("forName", "(Ljava/lang/String;)Ljava/lang/Class;"),
            ("newInstance", "()Ljava/lang/Object;"),
            ("getClassLoader", "()Ljava/lang/ClassLoader;"),
            ("isInstance", "(Ljava/lang/Object;)Z"),
            ("getResourceAsStream", "(Ljava/lang/String;)Ljava/io/InputStream;"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/ClassLoader",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[
            ("loadClass", "(Ljava/lang/String;)Ljava/lang/Class;"),
            ("getParent", "()Ljava/lang/ClassLoader;"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Enum",
        super_class: OBJECT,
        interfaces: &["java/lang/Comparable", "java/io/Serializable"],
        fields: &[],
        methods: &[("name", "()Ljava/lang/String;"), ("ordinal", "()I")],
    },
    RuntimeEntry {
        path: "java/lang/Thread",
        super_class: OBJECT,
        interfaces: &["java/lang/Runnable"],
        fields: &[("MIN_PRIORITY", "I"), ("NORM_PRIORITY", "I"), ("MAX_PRIORITY", "I")],
        methods: &[
            ("start", "()V"),
            ("join", "()V"),
            ("interrupt", "()V"),
            ("isAlive", "()Z"),
            ("sleep", "(J)V"),
            ("currentThread", "()Ljava/lang/Thread;"),
            ("getName", "()Ljava/lang/String;"),
            ("setDaemon", "(Z)V"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Throwable",
        super_class: OBJECT,
        interfaces: &["java/io/Serializable"],
        fields: &[],
        methods: &[
            ("getMessage", "()Ljava/lang/String;"),
            ("getCause", "()Ljava/lang/Throwable;"),
            ("printStackTrace", "()V"),
            ("getStackTrace", "()[Ljava/lang/StackTraceElement;"),
            ("addSuppressed", "(Ljava/lang/Throwable;)V"),
        ],
    },
    RuntimeEntry {
        path: "java/lang/Exception",
        super_class: Some("java/lang/Throwable"),
        interfaces: &[],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/lang/RuntimeException",
        super_class: Some("java/lang/Exception"),
        interfaces: &[],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/lang/IllegalArgumentException",
        super_class: Some("java/lang/RuntimeException"),
        interfaces: &[],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/lang/IllegalStateException",
        super_class: Some("java/lang/RuntimeException"),
        interfaces: &[],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/lang/NullPointerException",
        super_class: Some("java/lang/RuntimeException"),
        interfaces: &[],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/lang/Error",
        super_class: Some("java/lang/Throwable"),
        interfaces: &[],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/io/Serializable",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/io/PrintStream",
        super_class: Some("java/io/OutputStream"),
        interfaces: &[],
        fields: &[],
        methods: &[
            ("println", "(Ljava/lang/String;)V"),
            ("print", "(Ljava/lang/String;)V"),
            ("printf", "(Ljava/lang/String;[Ljava/lang/Object;)Ljava/io/PrintStream;"),
            ("format", "(Ljava/lang/String;[Ljava/lang/Object;)Ljava/io/PrintStream;"),
        ],
    },
    RuntimeEntry {
        path: "java/io/OutputStream",
        super_class: OBJECT,
        interfaces: &["java/lang/AutoCloseable"],
        fields: &[],
        methods: &[("write", "([B)V"), ("flush", "()V"), ("close", "()V")],
    },
    RuntimeEntry {
        path: "java/io/InputStream",
        super_class: OBJECT,
        interfaces: &["java/lang/AutoCloseable"],
        fields: &[],
        methods: &[("read", "()I"), ("available", "()I"), ("close", "()V")],
    },
    RuntimeEntry {
        path: "java/io/File",
        super_class: OBJECT,
        interfaces: &["java/io/Serializable", "java/lang/Comparable"],
        fields: &[("separator", "Ljava/lang/String;"), ("pathSeparator", "Ljava/lang/String;")],
        methods: &[
            ("exists", "()Z"),
            ("getName", "()Ljava/lang/String;"),
            ("getPath", "()Ljava/lang/String;"),
            ("getAbsolutePath", "()Ljava/lang/String;"),
            ("isDirectory", "()Z"),
            ("delete", "()Z"),
            ("mkdirs", "()Z"),
            ("listFiles", "()[Ljava/io/File;"),
        ],
    },
    RuntimeEntry {
        path: "java/util/Collection",
        super_class: OBJECT,
        interfaces: &["java/lang/Iterable"],
        fields: &[],
        methods: COLLECTION_METHODS,
    },
    RuntimeEntry {
        path: "java/util/List",
        super_class: OBJECT,
        interfaces: &["java/util/Collection"],
        fields: &[],
        methods: LIST_METHODS,
    },
    RuntimeEntry {
        path: "java/util/Set",
        super_class: OBJECT,
        interfaces: &["java/util/Collection"],
        fields: &[],
        methods: &[("of", "()Ljava/util/Set;")],
    },
    RuntimeEntry {
        path: "java/util/ArrayList",
        super_class: OBJECT,
        interfaces: &["java/util/List"],
        fields: &[],
        methods: &[("ensureCapacity", "(I)V"), ("trimToSize", "()V")],
    },
    RuntimeEntry {
        path: "java/util/LinkedList",
        super_class: OBJECT,
        interfaces: &["java/util/List"],
        fields: &[],
        methods: &[
            ("addFirst", "(Ljava/lang/Object;)V"),
            ("addLast", "(Ljava/lang/Object;)V"),
            ("getFirst", "()Ljava/lang/Object;"),
            ("getLast", "()Ljava/lang/Object;"),
        ],
    },
    RuntimeEntry {
        path: "java/util/HashSet",
        super_class: OBJECT,
        interfaces: &["java/util/Set"],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/util/Map",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: MAP_METHODS,
    },
    RuntimeEntry {
        path: "java/util/Map$Entry",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[
            ("getKey", "()Ljava/lang/Object;"),
            ("getValue", "()Ljava/lang/Object;"),
            ("setValue", "(Ljava/lang/Object;)Ljava/lang/Object;"),
        ],
    },
    RuntimeEntry {
        path: "java/util/HashMap",
        super_class: OBJECT,
        interfaces: &["java/util/Map"],
        fields: &[],
        methods: &[],
    },
    RuntimeEntry {
        path: "java/util/TreeMap",
        super_class: OBJECT,
        interfaces: &["java/util/Map"],
        fields: &[],
        methods: &[("firstKey", "()Ljava/lang/Object;"), ("lastKey", "()Ljava/lang/Object;")],
    },
    RuntimeEntry {
        path: "java/util/Iterator",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[("hasNext", "()Z"), ("next", "()Ljava/lang/Object;"), ("remove", "()V")],
    },
    RuntimeEntry {
        path: "java/util/Collections",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[
            ("EMPTY_LIST", "Ljava/util/List;"),
            ("EMPTY_SET", "Ljava/util/Set;"),
            ("EMPTY_MAP", "Ljava/util/Map;"),
        ],
        methods: &[
            ("emptyList", "()Ljava/util/List;"),
            ("emptyMap", "()Ljava/util/Map;"),
            ("unmodifiableList", "(Ljava/util/List;)Ljava/util/List;"),
            ("sort", "(Ljava/util/List;)V"),
            ("singletonList", "(Ljava/lang/Object;)Ljava/util/List;"),
        ],
    },
    RuntimeEntry {
        path: "java/util/Arrays",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[
            ("asList", "([Ljava/lang/Object;)Ljava/util/List;"),
            ("sort", "([I)V"),
            ("fill", "([II)V"),
            ("copyOf", "([II)[I"),
            ("toString", "([I)Ljava/lang/String;"),
            ("equals", "([I[I)Z"),
        ],
    },
    RuntimeEntry {
        path: "java/util/Objects",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[
            ("equals", "(Ljava/lang/Object;Ljava/lang/Object;)Z"),
            ("hash", "([Ljava/lang/Object;)I"),
            ("requireNonNull", "(Ljava/lang/Object;)Ljava/lang/Object;"),
            ("isNull", "(Ljava/lang/Object;)Z"),
            ("toString", "(Ljava/lang/Object;)Ljava/lang/String;"),
        ],
    },
    RuntimeEntry {
        path: "java/util/Optional",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[
            ("of", "(Ljava/lang/Object;)Ljava/util/Optional;"),
            ("empty", "()Ljava/util/Optional;"),
            ("isPresent", "()Z"),
            ("get", "()Ljava/lang/Object;"),
            ("orElse", "(Ljava/lang/Object;)Ljava/lang/Object;"),
        ],
    },
    RuntimeEntry {
        path: "java/util/Comparator",
        super_class: OBJECT,
        interfaces: &[],
        fields: &[],
        methods: &[("compare", "(Ljava/lang/Object;Ljava/lang/Object;)I")],
    },
    RuntimeEntry {
        path: "java/util/stream/Stream",
        super_class: OBJECT,
        interfaces: &["java/lang/AutoCloseable"],
        fields: &[],
        methods: &[
            ("map", "(Ljava/util/function/Function;)Ljava/util/stream/Stream;"),
            ("filter", "(Ljava/util/function/Predicate;)Ljava/util/stream/Stream;"),
            ("collect", "(Ljava/util/stream/Collector;)Ljava/lang/Object;"),
            ("forEach", "(Ljava/util/function/Consumer;)V"),
            ("count", "()J"),
        ],
    },
    RuntimeEntry {
        path: "java/util/concurrent/TimeUnit",
        super_class: Some("java/lang/Enum"),
        interfaces: &[],
        fields: &[
            ("NANOSECONDS", "Ljava/util/concurrent/TimeUnit;"),
            ("MICROSECONDS", "Ljava/util/concurrent/TimeUnit;"),
            ("MILLISECONDS", "Ljava/util/concurrent/TimeUnit;"),
            ("SECONDS", "Ljava/util/concurrent/TimeUnit;"),
            ("MINUTES", "Ljava/util/concurrent/TimeUnit;"),
            ("HOURS", "Ljava/util/concurrent/TimeUnit;"),
            ("DAYS", "Ljava/util/concurrent/TimeUnit;"),
        ],
        methods: &[("sleep", "(J)V"), ("toMillis", "(J)J")],
    },
];

static RUNTIME_TYPES: Lazy<HashMap<&'static str, TypeDeclaration>> = Lazy::new(|| {
    RUNTIME_LIBRARY
        .iter()
        .map(|entry| (entry.path, declaration_for(entry)))
        .collect()
});

fn declaration_for(entry: &RuntimeEntry) -> TypeDeclaration {
    let mut declaration = TypeDeclaration::new(entry.path);
    declaration.super_class = entry.super_class.map(str::to_string);
    declaration.interfaces = entry.interfaces.iter().map(|path| path.to_string()).collect();
    declaration.complete = entry.path == "java/lang/Object";

    for (name, descriptor) in entry.fields {
        match parse_field_descriptor(descriptor) {
            Ok(ty) => declaration.fields.push(MemberDeclaration::new(*name, ty)),
            Err(e) => warn!("Skipping runtime field {}.{}: {}", entry.path, name, e),
        }
    }
    for (name, descriptor) in entry.methods {
        match parse_method_descriptor(descriptor) {
            Ok((_, ret)) => declaration.methods.push(MemberDeclaration::new(*name, ret)),
            Err(e) => warn!("Skipping runtime method {}.{}: {}", entry.path, name, e),
        }
    }

    declaration
}

/// Symbol source for the standard runtime library
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeTypeSolver;

impl RuntimeTypeSolver {
    pub fn new() -> Self {
        Self
    }

    pub fn len(&self) -> usize {
        RUNTIME_TYPES.len()
    }

    pub fn is_empty(&self) -> bool {
        RUNTIME_TYPES.is_empty()
    }
}

impl TypeSolver for RuntimeTypeSolver {
    fn name(&self) -> &str {
        "runtime"
    }

    fn solve_type(&self, path: &str) -> Option<&TypeDeclaration> {
        RUNTIME_TYPES.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{CombinedTypeSolver, JavaType, MemberKind};
    use std::sync::Arc;

    #[test]
    fn test_every_descriptor_parses() {
        for entry in RUNTIME_LIBRARY {
            let decl = declaration_for(entry);
            assert_eq!(decl.fields.len(), entry.fields.len(), "{}", entry.path);
            assert_eq!(decl.methods.len(), entry.methods.len(), "{}", entry.path);
        }
    }

    #[test]
    fn test_system_out_is_a_print_stream() {
        let solver = RuntimeTypeSolver::new();
        let system = solver.solve_type("java/lang/System").unwrap();
        let out = system.member("out", MemberKind::Field).unwrap();
        assert_eq!(out.ty, JavaType::Class("java/io/PrintStream".to_string()));
        assert!(!system.complete);
        assert!(solver.solve_type("java/lang/Object").unwrap().complete);
    }

    #[test]
    fn test_inherited_runtime_member() {
        let solver = CombinedTypeSolver::new().with_source(Arc::new(RuntimeTypeSolver::new()));
        let found = solver
            .find_member("java/lang/Integer", "hashCode", MemberKind::Method)
            .unwrap();
        assert_eq!(found.declaring_type, "java/lang/Object");

        let open = solver
            .find_member("java/util/ArrayList", "forEach", MemberKind::Method)
            .unwrap();
        assert_eq!(open.declaring_type, "java/lang/Iterable");
    }
}
