//! Modelo de UserVerification
//!
//! Verificación de identidad en tres pasos: selfie, documento y selfie con documento.
//! Staff revisa el resultado final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    SelfieUploaded,
    IdUploaded,
    SelfieWithIdUploaded,
    Verified,
    Rejected,
}

/// Tipo de imagen subida
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Selfie,
    IdCard,
    SelfieWithId,
}

impl DocumentKind {
    /// Estado requerido antes de subir esta imagen
    pub fn required_status(&self) -> VerificationStatus {
        match self {
            DocumentKind::Selfie => VerificationStatus::Pending,
            DocumentKind::IdCard => VerificationStatus::SelfieUploaded,
            DocumentKind::SelfieWithId => VerificationStatus::IdUploaded,
        }
    }

    /// Estado resultante tras subir esta imagen
    pub fn resulting_status(&self) -> VerificationStatus {
        match self {
            DocumentKind::Selfie => VerificationStatus::SelfieUploaded,
            DocumentKind::IdCard => VerificationStatus::IdUploaded,
            DocumentKind::SelfieWithId => VerificationStatus::SelfieWithIdUploaded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Selfie => "selfie",
            DocumentKind::IdCard => "id_card",
            DocumentKind::SelfieWithId => "selfie_with_id",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "selfie" => Ok(DocumentKind::Selfie),
            "id_card" => Ok(DocumentKind::IdCard),
            "selfie_with_id" => Ok(DocumentKind::SelfieWithId),
            other => Err(format!("Invalid image type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub selfie_image: Option<Vec<u8>>,
    pub id_card_image: Option<Vec<u8>>,
    pub selfie_with_id_image: Option<Vec<u8>>,
    /// Clave AES-256-GCM del usuario; las imágenes anteriores están cifradas con ella
    pub encryption_key: Option<Vec<u8>>,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserVerification {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            selfie_image: None,
            id_card_image: None,
            selfie_with_id_image: None,
            encryption_key: None,
            status: VerificationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Imagen tal como está almacenada (cifrada)
    pub fn image(&self, kind: DocumentKind) -> Option<&[u8]> {
        match kind {
            DocumentKind::Selfie => self.selfie_image.as_deref(),
            DocumentKind::IdCard => self.id_card_image.as_deref(),
            DocumentKind::SelfieWithId => self.selfie_with_id_image.as_deref(),
        }
    }

    /// Guarda la imagen y avanza el estado; devuelve el estado esperado si el paso no corresponde
    pub fn attach(&mut self, kind: DocumentKind, content: Vec<u8>) -> Result<(), VerificationStatus> {
        if self.status != kind.required_status() {
            return Err(kind.required_status());
        }
        match kind {
            DocumentKind::Selfie => self.selfie_image = Some(content),
            DocumentKind::IdCard => self.id_card_image = Some(content),
            DocumentKind::SelfieWithId => self.selfie_with_id_image = Some(content),
        }
        self.status = kind.resulting_status();
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_order_is_enforced() {
        let mut verification = UserVerification::new(Uuid::new_v4());

        assert_eq!(
            verification.attach(DocumentKind::IdCard, vec![1]),
            Err(VerificationStatus::SelfieUploaded)
        );
        assert!(verification.attach(DocumentKind::Selfie, vec![1, 2]).is_ok());
        assert_eq!(verification.status, VerificationStatus::SelfieUploaded);
        assert!(verification.attach(DocumentKind::Selfie, vec![3]).is_err());
        assert!(verification.attach(DocumentKind::IdCard, vec![3]).is_ok());
        assert!(verification.attach(DocumentKind::SelfieWithId, vec![4]).is_ok());
        assert_eq!(verification.status, VerificationStatus::SelfieWithIdUploaded);
        assert_eq!(verification.image(DocumentKind::Selfie), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_document_kind_parse() {
        assert_eq!("id_card".parse::<DocumentKind>().unwrap(), DocumentKind::IdCard);
        assert!("passport".parse::<DocumentKind>().is_err());
    }
}
