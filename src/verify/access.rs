//! The accessibility rule: can a member or class declared in `R` be
//! referenced from class `D`?

use crate::classfile::{flags, ClassNode};
use crate::problems::{AccessLevel, Location};
use crate::verify::context::VerificationContext;
use crate::verify::hierarchy;

/// Violated access level of a member reference, or `None` when the access
/// is legal.
///
/// * public: always accessible.
/// * protected: accessible from the declaring class's package, or from a
///   subclass of the declaring class; for instance members the symbolic
///   owner must additionally be the accessing class or one of its
///   subclasses/superclasses.
/// * default: accessible from the declaring class's package only.
/// * private: accessible from the declaring class only.
pub fn member_access_violation(
    ctx: &mut VerificationContext<'_>,
    member_access: u16,
    declaring: &ClassNode,
    symbolic_owner: &ClassNode,
    from: &ClassNode,
    is_static_member: bool,
    location: &Location,
) -> Option<AccessLevel> {
    if flags::is_public(member_access) {
        return None;
    }
    if flags::is_private(member_access) {
        if declaring.name == from.name {
            return None;
        }
        return Some(AccessLevel::Private);
    }
    if flags::is_protected(member_access) {
        if flags::same_package(&declaring.name, &from.name) {
            return None;
        }
        if hierarchy::is_subclass_or_self(ctx, from, &declaring.name, location) {
            if is_static_member {
                return None;
            }
            if hierarchy::is_subclass_or_self(ctx, symbolic_owner, &from.name, location)
                || hierarchy::is_subclass_or_self(ctx, from, &symbolic_owner.name, location)
            {
                return None;
            }
        }
        return Some(AccessLevel::Protected);
    }
    // Package-private.
    if flags::same_package(&declaring.name, &from.name) {
        None
    } else {
        Some(AccessLevel::PackagePrivate)
    }
}

/// Violated access level of a class reference, or `None` when legal.
pub fn class_access_violation(
    ctx: &mut VerificationContext<'_>,
    class: &ClassNode,
    from: &ClassNode,
    location: &Location,
) -> Option<AccessLevel> {
    if flags::is_public(class.access) {
        return None;
    }
    if flags::is_private(class.access) {
        // Nested private classes; only the nest itself may reach them.
        if flags::same_package(&class.name, &from.name) {
            return None;
        }
        return Some(AccessLevel::Private);
    }
    if flags::is_protected(class.access) {
        if flags::same_package(&class.name, &from.name)
            || hierarchy::is_subclass_or_self(ctx, from, &class.name, location)
        {
            return None;
        }
        return Some(AccessLevel::Protected);
    }
    if flags::same_package(&class.name, &from.name) {
        None
    } else {
        Some(AccessLevel::PackagePrivate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::flags::access_flags::*;
    use crate::resolver::{FixedResolver, Resolver};
    use crate::testutil::{class, java_lang_object};
    use crate::VerifierParameters;

    #[test]
    fn package_private_requires_same_package() {
        let declaring = class("p/Owner").build();
        let same_pkg = class("p/User").build();
        let other_pkg = class("q/User").build();
        let mut resolver = FixedResolver::with_classes(vec![java_lang_object()]);
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("p/User");

        assert_eq!(
            member_access_violation(&mut ctx, 0, &declaring, &declaring, &same_pkg, false, &at),
            None
        );
        assert_eq!(
            member_access_violation(&mut ctx, 0, &declaring, &declaring, &other_pkg, false, &at),
            Some(AccessLevel::PackagePrivate)
        );
    }

    #[test]
    fn protected_instance_member_requires_receiver_in_hierarchy() {
        let declaring = class("p/Base").build();
        let subclass = class("q/Sub").extends("p/Base").build();
        let sibling = class("q/Sibling").extends("p/Base").build();
        let mut resolver = FixedResolver::with_classes(vec![
            java_lang_object(),
            declaring.clone(),
            subclass.clone(),
            sibling.clone(),
        ]);
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("q/Sub");

        // Receiver is the accessing class itself: fine.
        assert_eq!(
            member_access_violation(&mut ctx, ACC_PROTECTED, &declaring, &subclass, &subclass, false, &at),
            None
        );
        // Receiver is an unrelated sibling subclass: rejected.
        assert_eq!(
            member_access_violation(&mut ctx, ACC_PROTECTED, &declaring, &sibling, &subclass, false, &at),
            Some(AccessLevel::Protected)
        );
        // Static protected members skip the receiver restriction.
        assert_eq!(
            member_access_violation(&mut ctx, ACC_PROTECTED, &declaring, &sibling, &subclass, true, &at),
            None
        );
    }

    #[test]
    fn private_member_only_from_declaring_class() {
        let declaring = class("p/Owner").build();
        let mut resolver = FixedResolver::with_classes(vec![java_lang_object()]);
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("p/Owner");

        assert_eq!(
            member_access_violation(&mut ctx, ACC_PRIVATE, &declaring, &declaring, &declaring, false, &at),
            None
        );
        let other = class("p/Other").build();
        assert_eq!(
            member_access_violation(&mut ctx, ACC_PRIVATE, &declaring, &declaring, &other, false, &at),
            Some(AccessLevel::Private)
        );
    }
}
