//! Request and response models for the GoFile API

use std::fmt;

use serde::{Deserialize, Serialize};

/// Folder creation request body
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFolderRequest<'a> {
    pub parent_folder_id: &'a str,
    pub folder_name: &'a str,
}

/// Response envelope for folder creation
#[derive(Clone, Debug, Deserialize)]
pub struct CreateFolderResponse {
    /// API status marker, `"ok"` on success
    #[serde(default)]
    pub status: String,
    /// Created folder payload
    pub data: CreatedFolder,
}

/// A newly created folder
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFolder {
    /// Folder identifier
    #[serde(default)]
    pub id: String,
    /// Owning account identifier
    #[serde(default)]
    pub owner: String,
    /// Folder name
    #[serde(default)]
    pub name: String,
    /// Parent folder identifier
    #[serde(default, rename = "parentFolder")]
    pub parent_folder_id: String,
    /// Creation time (unix seconds)
    #[serde(default)]
    pub create_time: i64,
    /// Share code
    #[serde(default)]
    pub code: String,
}

impl fmt::Display for CreatedFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}; owner: {}; name: {}; parentFolder: {}; createTime: {}; code: {}",
            self.id, self.owner, self.name, self.parent_folder_id, self.create_time, self.code
        )
    }
}

/// Response envelope for file upload
#[derive(Clone, Debug, Deserialize)]
pub struct UploadFileResponse {
    /// API status marker, `"ok"` on success
    #[serde(default)]
    pub status: String,
    /// Uploaded file payload
    pub data: UploadedFile,
}

/// An uploaded file as reported by the upload endpoint
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// File identifier
    #[serde(default)]
    pub id: String,
    /// Content MD5 as computed by the service
    #[serde(default)]
    pub md5: String,
    /// Detected MIME type
    #[serde(default)]
    pub mimetype: String,
    /// File name
    #[serde(default)]
    pub name: String,
    /// Parent folder identifier
    #[serde(default, rename = "parentFolder")]
    pub parent_folder_id: String,
    /// Share code of the parent folder
    #[serde(default)]
    pub parent_folder_code: String,
    /// Servers hosting the file
    #[serde(default)]
    pub servers: Vec<String>,
    /// Size in bytes
    #[serde(default)]
    pub size: i64,
    /// Content type (`"file"`)
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Creation time (unix seconds)
    #[serde(default)]
    pub create_time: i64,
    /// Browser download page
    #[serde(default)]
    pub download_page: String,
}

impl fmt::Display for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}; name: {}; md5: {}; size: {}; mimetype: {}; servers: {:?}; downloadPage: {}",
            self.id, self.name, self.md5, self.size, self.mimetype, self.servers, self.download_page
        )
    }
}

/// Response envelope for file-info lookup
#[derive(Clone, Debug, Deserialize)]
pub struct FileInfoResponse {
    /// API status marker, `"ok"` on success
    #[serde(default)]
    pub status: String,
    /// File metadata payload
    pub data: FileInfo,
}

/// File metadata
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// File identifier
    #[serde(default)]
    pub id: String,
    /// Parent folder identifier
    #[serde(default, rename = "parentFolder")]
    pub parent_folder_id: String,
    /// Content type (`"file"` or `"folder"`)
    #[serde(default, rename = "type")]
    pub kind: String,
    /// File name
    #[serde(default)]
    pub name: String,
    /// Creation time (unix seconds)
    #[serde(default)]
    pub create_time: i64,
    /// Size in bytes
    #[serde(default)]
    pub size: i64,
    /// Detected MIME type
    #[serde(default)]
    pub mimetype: String,
    /// Servers hosting the file
    #[serde(default)]
    pub servers: Vec<String>,
    /// Server the service recommends downloading from
    #[serde(default)]
    pub server_selected: String,
    /// Browser download page
    #[serde(default, rename = "link")]
    pub download_page: String,
    /// Thumbnail URL, when available
    #[serde(default, rename = "thumbnail")]
    pub thumbnail_link: String,
    /// Content MD5
    #[serde(default)]
    pub md5: String,
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}; name: {}; md5: {}; size: {}; type: {}; mimetype: {}; serverSelected: {}; link: {}",
            self.id,
            self.name,
            self.md5,
            self.size,
            self.kind,
            self.mimetype,
            self.server_selected,
            self.download_page
        )
    }
}

/// Account-id lookup response (`GET accounts/getid`)
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AccountIdResponse {
    pub data: AccountIdData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct AccountIdData {
    #[serde(default)]
    pub id: String,
}

/// Account-info lookup response (`GET accounts/{id}`)
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AccountInfoResponse {
    pub data: AccountInfoData,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountInfoData {
    #[serde(default)]
    pub root_folder: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_file_info_renames() {
        let json = r#"{
            "status": "ok",
            "data": {
                "id": "f-1",
                "parentFolder": "p-1",
                "type": "file",
                "name": "report.pdf",
                "size": 1024,
                "mimetype": "application/pdf",
                "servers": ["store1", "store2"],
                "serverSelected": "store1",
                "link": "https://gofile.io/d/abc",
                "thumbnail": "",
                "md5": "d41d8cd98f00b204e9800998ecf8427e"
            }
        }"#;

        let resp: FileInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.data.parent_folder_id, "p-1");
        assert_eq!(resp.data.kind, "file");
        assert_eq!(resp.data.server_selected, "store1");
        assert_eq!(resp.data.download_page, "https://gofile.io/d/abc");
    }

    #[test]
    fn deserialize_tolerates_missing_and_unknown_fields() {
        // `status`, `tier`, and `email` are carried by the service but not
        // modeled; serde drops them.
        let resp: AccountIdResponse = serde_json::from_str(
            r#"{"status":"ok","data":{"tier":"standard","email":"a@b.c"}}"#,
        )
        .unwrap();
        assert!(resp.data.id.is_empty());

        let resp: AccountInfoResponse =
            serde_json::from_str(r#"{"status":"ok","data":{"rootFolder":"root-1"}}"#).unwrap();
        assert_eq!(resp.data.root_folder, "root-1");
    }

    #[test]
    fn serialize_create_folder_request() {
        let body = CreateFolderRequest {
            parent_folder_id: "p-9",
            folder_name: "backups",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"parentFolderId":"p-9","folderName":"backups"}"#);
    }
}
