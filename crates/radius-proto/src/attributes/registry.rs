use std::collections::HashMap;
use std::sync::LazyLock;

use super::attribute::{Attribute, RawAttribute};
use super::typed::{
    AcctSessionId, AcctStatus, CalledStationId, CallingStationId, FramedIpAddress,
    MessageAuthenticator, NasIdentifier, NasIpAddress, TaggedTunnelMediumType, TaggedTunnelType,
    TunnelPrivateGroupId, TypedAttribute, UserName,
};
use crate::packet::PacketError;

/// Builds a typed [`Attribute`] from its raw form
pub type AttributeConstructor = fn(&RawAttribute) -> Result<Attribute, PacketError>;

fn construct<T: TypedAttribute>(raw: &RawAttribute) -> Result<Attribute, PacketError> {
    T::from_raw(raw).map(Into::into)
}

const BUILTIN: &[(u8, AttributeConstructor)] = &[
    (UserName::TYPE as u8, construct::<UserName>),
    (NasIpAddress::TYPE as u8, construct::<NasIpAddress>),
    (FramedIpAddress::TYPE as u8, construct::<FramedIpAddress>),
    (CalledStationId::TYPE as u8, construct::<CalledStationId>),
    (CallingStationId::TYPE as u8, construct::<CallingStationId>),
    (NasIdentifier::TYPE as u8, construct::<NasIdentifier>),
    (AcctStatus::TYPE as u8, construct::<AcctStatus>),
    (AcctSessionId::TYPE as u8, construct::<AcctSessionId>),
    (TaggedTunnelType::TYPE as u8, construct::<TaggedTunnelType>),
    (TaggedTunnelMediumType::TYPE as u8, construct::<TaggedTunnelMediumType>),
    (MessageAuthenticator::TYPE as u8, construct::<MessageAuthenticator>),
    (TunnelPrivateGroupId::TYPE as u8, construct::<TunnelPrivateGroupId>),
];

static SHARED: LazyLock<AttributeRegistry> = LazyLock::new(AttributeRegistry::with_defaults);

/// Maps attribute type codes to typed constructors.
///
/// The table is fixed at compile time; there is no runtime discovery.
#[derive(Clone)]
pub struct AttributeRegistry {
    constructors: HashMap<u8, AttributeConstructor>,
}

impl AttributeRegistry {
    /// Registry with every typed attribute this crate defines
    pub fn with_defaults() -> Self {
        AttributeRegistry {
            constructors: BUILTIN.iter().copied().collect(),
        }
    }

    /// Registry that keeps every attribute raw
    pub fn empty() -> Self {
        AttributeRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Process-wide instance of [`AttributeRegistry::with_defaults`]
    pub fn shared() -> &'static AttributeRegistry {
        &SHARED
    }

    pub fn register(&mut self, attr_type: u8, constructor: AttributeConstructor) {
        self.constructors.insert(attr_type, constructor);
    }

    pub fn is_registered(&self, attr_type: u8) -> bool {
        self.constructors.contains_key(&attr_type)
    }

    /// Convert a raw attribute into its typed form.
    ///
    /// Unregistered types and values the constructor rejects are returned
    /// unchanged as [`Attribute::Raw`].
    pub fn resolve(&self, raw: RawAttribute) -> Attribute {
        match self.constructors.get(&raw.attr_type) {
            Some(constructor) => constructor(&raw).unwrap_or(Attribute::Raw(raw)),
            None => Attribute::Raw(raw),
        }
    }
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for AttributeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.constructors.keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("AttributeRegistry")
            .field("types", &types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeType;

    #[test]
    fn test_default_types_registered() {
        let registry = AttributeRegistry::shared();
        for attr_type in [1u8, 4, 8, 30, 31, 32, 40, 44, 64, 65, 80, 81] {
            assert!(registry.is_registered(attr_type), "type {}", attr_type);
        }
        assert!(!registry.is_registered(AttributeType::VendorSpecific.as_u8()));
    }

    #[test]
    fn test_resolve_typed() {
        let raw = RawAttribute::new(1, b"dev".to_vec()).unwrap();
        let attr = AttributeRegistry::shared().resolve(raw);
        assert_eq!(attr, Attribute::UserName(UserName::new("dev")));
    }

    #[test]
    fn test_resolve_unknown_stays_raw() {
        let raw = RawAttribute::new(26, vec![0, 0, 0, 9]).unwrap();
        let attr = AttributeRegistry::shared().resolve(raw.clone());
        assert_eq!(attr, Attribute::Raw(raw));
    }

    #[test]
    fn test_resolve_malformed_stays_raw() {
        let raw = RawAttribute::new(4, vec![1, 2]).unwrap();
        let attr = AttributeRegistry::shared().resolve(raw.clone());
        assert_eq!(attr, Attribute::Raw(raw));
    }

    #[test]
    fn test_empty_registry() {
        let raw = RawAttribute::new(1, b"dev".to_vec()).unwrap();
        assert!(AttributeRegistry::empty().resolve(raw).is_raw());
    }

    #[test]
    fn test_register_overrides() {
        fn always_raw(raw: &RawAttribute) -> Result<Attribute, PacketError> {
            Ok(Attribute::Raw(raw.clone()))
        }
        let mut registry = AttributeRegistry::with_defaults();
        registry.register(1, always_raw);
        let raw = RawAttribute::new(1, b"dev".to_vec()).unwrap();
        assert!(registry.resolve(raw).is_raw());
    }
}
