//! Declaration macros shared by the schema types.

/// Implement [`RegisteredType`](crate::nwb::RegisteredType) and
/// [`SchemaType`](crate::nwb::SchemaType) for a type that stores its
/// [`TypeBase`](crate::nwb::TypeBase) at the given field chain.
///
/// The type must provide `fn with_base(base: TypeBase) -> Self`. An optional
/// `finalize = method` routes `RegisteredType::finalize` to an inherent
/// method.
macro_rules! impl_registered_type {
    (@common $($base:ident).+) => {
        fn base(&self) -> &$crate::nwb::TypeBase {
            &self.$($base).+
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn into_any(
            self: ::std::sync::Arc<Self>,
        ) -> ::std::sync::Arc<dyn ::std::any::Any + Send + Sync> {
            self
        }
    };
    (@schema $ty:ty, $ns:expr, $name:expr) => {
        impl $crate::nwb::SchemaType for $ty {
            const NAMESPACE: &'static str = $ns;
            const TYPE_NAME: &'static str = $name;

            fn new(path: &str, io: &$crate::io::SharedIo) -> Self {
                Self::with_base($crate::nwb::TypeBase::new(path, io, $ns, $name))
            }
        }
    };
    ($ty:ty, $ns:expr, $name:expr, base = $($base:ident).+) => {
        impl $crate::nwb::RegisteredType for $ty {
            impl_registered_type!(@common $($base).+);
        }
        impl_registered_type!(@schema $ty, $ns, $name);
    };
    ($ty:ty, $ns:expr, $name:expr, base = $($base:ident).+, finalize = $finalize:ident) => {
        impl $crate::nwb::RegisteredType for $ty {
            impl_registered_type!(@common $($base).+);

            fn finalize(&self) -> $crate::error::Result<()> {
                self.$finalize()
            }
        }
        impl_registered_type!(@schema $ty, $ns, $name);
    };
}

/// Declare the fields of a schema type.
///
/// Each entry is `kind name [/ write_name]: Type = "relative/path", "doc";`
/// where `kind` is `attribute`, `dataset` or `registered`. Attribute and
/// dataset entries produce lazy [`ReadDataWrapper`](crate::io::ReadDataWrapper)
/// accessors; dataset entries with a `write_name` also get a write-handle
/// accessor. Registered entries return the typed sub-object when it exists.
/// All entries are listed in the type's `FIELDS` table.
macro_rules! define_fields {
    ($ty:ty { $($kind:ident $name:ident $(/ $write:ident)? : $elem:ty = $path:literal, $doc:literal;)* }) => {
        impl $ty {
            /// Fields declared by this type, relative to its path.
            pub const FIELDS: &'static [$crate::nwb::FieldDef] = &[
                $($crate::nwb::FieldDef {
                    name: stringify!($name),
                    path: $path,
                    kind: define_fields!(@kind $kind),
                    type_name: stringify!($elem),
                    doc: $doc,
                },)*
            ];

            $(define_fields!(@accessor $kind $name $(/ $write)? : $elem = $path, $doc);)*
        }
    };
    (@kind attribute) => { $crate::nwb::FieldKind::Attribute };
    (@kind dataset) => { $crate::nwb::FieldKind::Dataset };
    (@kind registered) => { $crate::nwb::FieldKind::Registered };
    (@accessor attribute $name:ident : $elem:ty = $path:literal, $doc:literal) => {
        #[doc = $doc]
        pub fn $name(&self) -> $crate::io::ReadDataWrapper<$crate::io::Attribute, $elem> {
            $crate::nwb::RegisteredType::base(self).attribute($path)
        }
    };
    (@accessor dataset $name:ident $(/ $write:ident)? : $elem:ty = $path:literal, $doc:literal) => {
        #[doc = $doc]
        pub fn $name(&self) -> $crate::io::ReadDataWrapper<$crate::io::Dataset, $elem> {
            $crate::nwb::RegisteredType::base(self).dataset($path)
        }

        $(
            #[doc = concat!("Write handle for `", $path, "`.")]
            pub fn $write(
                &self,
            ) -> $crate::error::Result<::std::sync::Arc<dyn $crate::io::RecordingData>> {
                $crate::nwb::RegisteredType::base(self).recording_data($path)
            }
        )?
    };
    (@accessor registered $name:ident : $elem:ty = $path:literal, $doc:literal) => {
        #[doc = $doc]
        pub fn $name(&self) -> Option<::std::sync::Arc<$elem>> {
            $crate::nwb::RegisteredType::base(self).registered::<$elem>($path)
        }
    };
}

/// `Deref` from a composed type to the type it wraps.
macro_rules! deref_to {
    ($ty:ty => $target:ty, $field:ident) => {
        impl ::std::ops::Deref for $ty {
            type Target = $target;

            fn deref(&self) -> &$target {
                &self.$field
            }
        }
    };
}
