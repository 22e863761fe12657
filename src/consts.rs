// Global safety caps to prevent pathological or infinite loops

// Hierarchy walker: maximum classes visited in any single BFS over
// superclass/superinterface edges. Malformed hierarchies terminate the
// walk with a negative answer instead of spinning.
pub const HIERARCHY_MAX_BFS_STEPS: usize = 10_000;

// Dependency graph: maximum vertices resolved transitively from one plugin.
pub const DEPENDENCY_MAX_VERTICES: usize = 10_000;

// Problem registrar: minimum number of ClassNotFound problems sharing a
// package prefix before they collapse into a single PackageNotFound.
pub const PACKAGE_ROLLUP_THRESHOLD: usize = 5;

// Earliest supported class file major version (JDK 1.1).
pub const MIN_CLASS_FILE_MAJOR: u16 = 45;

pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";

// Owners of signature-polymorphic methods (JVMS 2.9.3).
pub const SIGNATURE_POLYMORPHIC_OWNERS: &[&str] = &[
    "java/lang/invoke/MethodHandle",
    "java/lang/invoke/VarHandle",
];

// Marker annotations recognized on classes, methods and fields.
pub const DEPRECATED_ANNOTATION: &str = "Ljava/lang/Deprecated;";
pub const EXPERIMENTAL_API_ANNOTATION: &str = "Lorg/jetbrains/annotations/ApiStatus$Experimental;";
pub const INTERNAL_API_ANNOTATION: &str = "Lorg/jetbrains/annotations/ApiStatus$Internal;";
