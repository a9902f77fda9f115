name_type!(VolumeName);
name_type!(GroupName);
name_type!(SubvolumeName);
name_type!(SnapshotName);
